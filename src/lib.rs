//! # Dynaquery
//!
//! Dynamic listing, search and projection queries over typed collections,
//! executed in relaxed-isolation read scopes on the `may` runtime.
//!
//! The crate has two halves:
//!
//! - **Build pipeline** ([`query`]): locate a collection by name, then compose
//!   ordering, paging, search predicates and projections from request
//!   descriptors. Builders are pure and return new immutable handles.
//! - **Execution** ([`relaxed`]): run a handle in a bounded read scope through
//!   a [`QueryEngine`], either PostgreSQL over `may_postgres` or the
//!   in-memory engine.
//!
//! ```
//! use dynaquery::memory::MemoryEngine;
//! use dynaquery::{Listing, Paging, Query, ReadOptions, RelaxedExecutor, Shape};
//!
//! #[derive(Shape, Clone, Debug, PartialEq)]
//! struct Product {
//!     id: u64,
//!     name: String,
//! }
//!
//! let rows: Vec<Product> = (1..=30)
//!     .map(|id| Product { id, name: format!("p{id}") })
//!     .collect();
//! let executor = RelaxedExecutor::new(
//!     MemoryEngine::new().with_rows("products", &rows),
//!     ReadOptions::default(),
//! );
//!
//! let listing = Listing {
//!     column_order: "id".into(),
//!     is_desc: true,
//!     paging: Paging::new(2, 10),
//! };
//! let page = executor.to_paged(&Query::<Product>::new("products"), &listing, None, None)?;
//! assert_eq!(page.total, 30);
//! assert_eq!(page.data.first().map(|p| p.id), Some(11));
//! # Ok::<(), dynaquery::LifeError>(())
//! ```

// Derive output names `::dynaquery::...`, including inside this crate.
extern crate self as dynaquery;

pub mod config;
pub mod executor;
pub mod memory;
pub mod model;
pub mod observability;
pub mod query;
pub mod relaxed;
pub mod shape;
pub mod transaction;
pub mod value;

pub use config::ReadOptions;
pub use executor::{LifeError, MayPostgresEngine, PostgresReadSession, QueryEngine, ReadSession};
pub use model::{Message, PagedResult};
pub use query::{
    direction_for, get_collection, get_dyn_collection, page_offset, read_descriptor, resolve_order_property,
    select_operator, Binding, BindingSource, Clause, Collection, Container, Descriptor, Direction, DynQuery,
    JsonDescriptor, Listing, ListingSpec, Operator, Paging, Predicate, Projection, Query, QueryError,
};
pub use relaxed::RelaxedExecutor;
pub use shape::{FromRecord, IntoRecord, Property, Record, Shape, ShapeInfo};
pub use transaction::{IsolationLevel, ReadScope, Release};
pub use value::{Coerced, Value, ValueExtractionError, ValueKind, ValueType};

pub use dynaquery_derive::{Descriptor, Shape};
