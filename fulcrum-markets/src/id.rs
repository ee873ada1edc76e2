//! Opaque 128-bit identifiers.
//!
//! Every entity in spec.md §3 is identified by an opaque token, not by a
//! natural key. [`Id`] is phantom-tagged per entity kind so `Id<User>` and
//! `Id<Account>` are distinct types at compile time and cannot be mixed up
//! by accident — the same trick the teacher uses for `OrderId`/`StrategyId`
//! newtypes.

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, hash::Hash, marker::PhantomData, str::FromStr};
use uuid::Uuid;

pub struct Id<Kind> {
    value: u128,
    _kind: PhantomData<fn() -> Kind>,
}

impl<Kind> Id<Kind> {
    pub fn new() -> Self {
        Self {
            value: Uuid::new_v4().as_u128(),
            _kind: PhantomData,
        }
    }

    pub fn from_u128(value: u128) -> Self {
        Self {
            value,
            _kind: PhantomData,
        }
    }

    pub fn as_u128(&self) -> u128 {
        self.value
    }
}

impl<Kind> Default for Id<Kind> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Kind> Clone for Id<Kind> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<Kind> Copy for Id<Kind> {}

impl<Kind> PartialEq for Id<Kind> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
impl<Kind> Eq for Id<Kind> {}

impl<Kind> PartialOrd for Id<Kind> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<Kind> Ord for Id<Kind> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<Kind> Hash for Id<Kind> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<Kind> fmt::Debug for Id<Kind> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", Uuid::from_u128(self.value))
    }
}

impl<Kind> fmt::Display for Id<Kind> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_u128(self.value))
    }
}

impl<Kind> FromStr for Id<Kind> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_u128(Uuid::parse_str(s)?.as_u128()))
    }
}

impl<Kind> Serialize for Id<Kind> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Uuid::from_u128(self.value).serialize(serializer)
    }
}

impl<'de, Kind> Deserialize<'de> for Id<Kind> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let uuid = Uuid::deserialize(deserializer).map_err(D::Error::custom)?;
        Ok(Self::from_u128(uuid.as_u128()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MarkerA;
    struct MarkerB;

    #[test]
    fn ids_round_trip_through_display_and_from_str() {
        let id = Id::<MarkerA>::new();
        let parsed: Id<MarkerA> = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn distinct_kinds_do_not_collide_by_construction() {
        let a = Id::<MarkerA>::new();
        let b = Id::<MarkerB>::from_u128(a.as_u128());
        // Same bit pattern is fine to construct independently; the type
        // system, not runtime equality, is what prevents Id<MarkerA> from
        // being handed to a function expecting Id<MarkerB>.
        assert_eq!(a.as_u128(), b.as_u128());
    }
}
