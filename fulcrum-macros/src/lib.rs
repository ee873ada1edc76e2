//! # Macros — code generation for broker-kind boilerplate
//!
//! Small proc-macro crate reducing the repetitive `Serialize`/`Deserialize`
//! impls a unit-struct broker marker needs when its wire representation is
//! just its own id string.
//!
//! ## Available macros
//!
//! ### `DeBroker`
//! Generates a `Deserialize` implementation that validates the
//! deserialized string against the type's `ID` constant.
//!
//! ### `SerBroker`
//! Generates a `Serialize` implementation that writes the type's `ID`
//! constant.
//!
//! Both require the annotated type to define `const ID: &'static str`.
//!
//! ```rust,ignore
//! #[derive(Default, DeBroker, SerBroker)]
//! struct ZerodhaMarker;
//!
//! impl ZerodhaMarker {
//!     const ID: &'static str = "zerodha";
//! }
//! ```

extern crate proc_macro;

use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use quote::quote;
use syn::DeriveInput;

#[proc_macro_derive(DeBroker)]
pub fn de_broker_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput =
        syn::parse(input).expect("DeBroker: failed to parse input TokenStream");
    let broker = &ast.ident;

    let generated = quote! {
        impl<'de> serde::Deserialize<'de> for #broker {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::de::Deserializer<'de>,
            {
                let input = <String as serde::Deserialize>::deserialize(deserializer)?;
                let expected = #broker::ID;

                if input.as_str() == expected {
                    Ok(Self::default())
                } else {
                    Err(serde::de::Error::invalid_value(
                        serde::de::Unexpected::Str(input.as_str()),
                        &expected,
                    ))
                }
            }
        }
    };

    TokenStream::from(generated)
}

#[proc_macro_derive(SerBroker)]
pub fn ser_broker_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput =
        syn::parse(input).expect("SerBroker: failed to parse input TokenStream");
    let broker = &ast.ident;

    let generated = quote! {
        impl serde::Serialize for #broker {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::ser::Serializer,
            {
                serializer.serialize_str(#broker::ID)
            }
        }
    };

    TokenStream::from(generated)
}

/// Derives a `kind_tag()` method returning the snake_case form of the
/// type's own name — used by `Custom` broker-kind variants that want a
/// stable string key without redeclaring it.
#[proc_macro_derive(KindTag)]
pub fn kind_tag_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput =
        syn::parse(input).expect("KindTag: failed to parse input TokenStream");
    let name = &ast.ident;
    let tag = name.to_string().to_case(Case::Snake);

    let generated = quote! {
        impl #name {
            pub fn kind_tag() -> &'static str {
                #tag
            }
        }
    };

    TokenStream::from(generated)
}
