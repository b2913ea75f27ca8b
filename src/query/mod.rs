//! Query construction.
//!
//! This module builds listing, search and projection queries against
//! collections whose element shape is only known through [`Shape`] tables.
//! Every builder appends clauses to a persistent handle and returns a new one.
//!
//! # Architecture
//!
//! - **Handle**: typed [`Query<T>`] and untyped [`DynQuery`]
//! - **Locator**: collection lookup by name fragment
//! - **Descriptor**: structural reading of listing/search requests
//! - **Builders**: order, paging, search, projection and the listing composer
//! - **Lowering**: clause IR to sea-query `SELECT`
//!
//! # Examples
//!
//! ```
//! use dynaquery::{get_collection, Collection, Container, Listing, Paging, Shape};
//!
//! #[derive(Shape, Clone, Debug)]
//! struct Product {
//!     id: u64,
//!     name: String,
//!     price: f64,
//! }
//!
//! struct Catalog;
//!
//! impl Container for Catalog {
//!     fn collections(&self) -> Vec<Collection> {
//!         vec![Collection::of::<Product>("Products")]
//!     }
//! }
//!
//! let listing = Listing {
//!     column_order: String::new(),
//!     is_desc: true,
//!     paging: Paging::new(2, 25),
//! };
//!
//! let query = get_collection::<Product, _>(&Catalog, "product")?
//!     .expect("Products holds Product")
//!     .build_listing(&listing)?;
//! assert_eq!(query.to_string(), "Products.order_by(id, asc).skip(25).take(25)");
//! # Ok::<(), dynaquery::QueryError>(())
//! ```
//!
//! [`Shape`]: crate::Shape

// Clause IR
pub mod clause;
#[doc(inline)]
pub use clause::{Binding, BindingSource, Clause, Direction, Operator, Predicate, Projection};

// Build-time errors
pub mod error;
#[doc(inline)]
pub use error::QueryError;

// Query handles
pub mod handle;
#[doc(inline)]
pub use handle::{DynQuery, Query};

// Collection lookup
pub mod locator;
#[doc(inline)]
pub use locator::{get_collection, get_dyn_collection, Collection, Container};

// Descriptor reading
pub mod descriptor;
#[doc(inline)]
pub use descriptor::{page_offset, read_descriptor, Descriptor, JsonDescriptor, Listing, ListingSpec, Paging};

// Builders
pub mod listing;
pub mod order;
pub mod paging;
pub mod projection;
pub mod search;
#[doc(inline)]
pub use order::{direction_for, resolve_order_property};
#[doc(inline)]
pub use search::select_operator;

// SQL lowering
pub mod lower;

// Value conversion utilities
pub(crate) mod value_conversion;
