//! Procedural macros for dynaquery
//!
//! This crate provides derive macros for `Shape` and `Descriptor`. Generated
//! code refers to the runtime crate as `::dynaquery`.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `Shape` - generates the compile-time property table
///
/// This macro generates:
/// - `Shape` implementation (`NAME` and ordered `PROPERTIES`)
/// - `IntoRecord` implementation (field values in declaration order)
/// - `FromRecord` implementation (typed extraction per field)
///
/// Every field type must implement `dynaquery::ValueType` and `Clone`.
///
/// Field attributes:
/// - `#[shape(key)]` marks the primary-key-like property
/// - `#[shape(rename = "name")]` sets the property name
/// - `#[shape(skip)]` leaves the field out; it is rebuilt with `Default`
#[proc_macro_derive(Shape, attributes(shape))]
pub fn derive_shape(input: TokenStream) -> TokenStream {
    macros::derive_shape(input)
}

/// Derive macro for `Descriptor` - exposes struct fields to the descriptor reader
///
/// Field attributes:
/// - `#[descriptor(flatten)]` inlines the fields of a nested descriptor and
///   inherits its computed page offset
/// - `#[descriptor(rename = "name")]` sets the field name
/// - `#[descriptor(skip)]` hides the field
///
/// Struct attribute:
/// - `#[descriptor(offset = "method")]` names a `fn(&self) -> u64` that
///   computes the page offset
#[proc_macro_derive(Descriptor, attributes(descriptor))]
pub fn derive_descriptor(input: TokenStream) -> TokenStream {
    macros::derive_descriptor(input)
}
