//! Derive implementations

mod descriptor;
mod shape;

pub use descriptor::derive_descriptor;
pub use shape::derive_shape;
