//! Channel-kind-agnostic send abstraction.
//!
//! The orchestrator and the Execution Event Store forward events to
//! whatever is listening (analytics, UI timelines, test probes) without
//! caring whether the channel is bounded, unbounded, or a broadcast. Code
//! against [`Tx`], not against a concrete `tokio::sync::mpsc` type.

use std::fmt::Debug;

pub trait Tx<Item>: Debug + Send + Sync {
    type Error: Debug;

    fn send(&self, item: Item) -> Result<(), Self::Error>;
}

/// Wraps an unbounded [`tokio::sync::mpsc::UnboundedSender`] as a [`Tx`].
#[derive(Debug, Clone)]
pub struct UnboundedTx<Item>(pub tokio::sync::mpsc::UnboundedSender<Item>);

impl<Item: Debug + Send + Sync> Tx<Item> for UnboundedTx<Item> {
    type Error = tokio::sync::mpsc::error::SendError<Item>;

    fn send(&self, item: Item) -> Result<(), Self::Error> {
        self.0.send(item)
    }
}

/// A [`Tx`] that silently drops every send whose receiver has gone away,
/// rather than surfacing an error. Useful for best-effort fan-out (eg/
/// analytics subscribers) where a dropped receiver must never abort the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct ChannelTxDroppable<T>(pub T);

impl<Item, T> Tx<Item> for ChannelTxDroppable<T>
where
    Item: Debug + Send + Sync,
    T: Tx<Item>,
{
    type Error = std::convert::Infallible;

    fn send(&self, item: Item) -> Result<(), Self::Error> {
        let _ = self.0.send(item);
        Ok(())
    }
}
