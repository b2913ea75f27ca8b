//! Query handles.
//!
//! A handle names a collection, knows the element shape it currently yields
//! and holds the clause sequence built so far. Handles are persistent: every
//! builder takes `&self` and returns a new handle, leaving the original usable.

use crate::query::clause::Clause;
use crate::shape::{Shape, ShapeInfo};
use std::fmt;
use std::marker::PhantomData;

/// Untyped query handle. The element shape is known only at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct DynQuery {
    collection: String,
    source: ShapeInfo,
    shape: ShapeInfo,
    clauses: Vec<Clause>,
}

impl DynQuery {
    /// A bare handle over `collection` yielding elements of `shape`.
    pub fn new(collection: impl Into<String>, shape: ShapeInfo) -> Self {
        Self {
            collection: collection.into(),
            source: shape,
            shape,
            clauses: Vec::new(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Element shape of the underlying collection.
    pub fn source_shape(&self) -> ShapeInfo {
        self.source
    }

    /// Element shape this handle currently yields (changes after a projection).
    pub fn shape(&self) -> ShapeInfo {
        self.shape
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Attach a static element type. `None` when the shape does not match `T`.
    pub fn typed<T: Shape>(self) -> Option<Query<T>> {
        (self.shape == ShapeInfo::of::<T>()).then(|| Query::from_dyn(self))
    }

    pub(crate) fn push(&self, clause: Clause) -> Self {
        let mut next = self.clone();
        next.clauses.push(clause);
        next
    }

    pub(crate) fn push_all(&self, clauses: impl IntoIterator<Item = Clause>) -> Self {
        let mut next = self.clone();
        next.clauses.extend(clauses);
        next
    }

    pub(crate) fn reshape(&self, clause: Clause, shape: ShapeInfo) -> Self {
        let mut next = self.push(clause);
        next.shape = shape;
        next
    }
}

impl fmt::Display for DynQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection)?;
        for clause in &self.clauses {
            write!(f, ".{clause}")?;
        }
        Ok(())
    }
}

/// Typed query handle over elements of `T`.
pub struct Query<T> {
    inner: DynQuery,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Shape> Query<T> {
    pub fn new(collection: impl Into<String>) -> Self {
        Self::from_dyn(DynQuery::new(collection, ShapeInfo::of::<T>()))
    }
}

impl<T> Query<T> {
    pub(crate) fn from_dyn(inner: DynQuery) -> Self {
        Self {
            inner,
            _phantom: PhantomData,
        }
    }

    /// Apply an untyped builder step while keeping the element type.
    pub(crate) fn map_dyn(&self, f: impl FnOnce(&DynQuery) -> DynQuery) -> Self {
        Self::from_dyn(f(&self.inner))
    }

    pub fn as_dyn(&self) -> &DynQuery {
        &self.inner
    }

    pub fn into_dyn(self) -> DynQuery {
        self.inner
    }

    pub fn collection(&self) -> &str {
        self.inner.collection()
    }

    pub fn shape(&self) -> ShapeInfo {
        self.inner.shape()
    }

    pub fn clauses(&self) -> &[Clause] {
        self.inner.clauses()
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self::from_dyn(self.inner.clone())
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("element", &std::any::type_name::<T>())
            .field("inner", &self.inner)
            .finish()
    }
}

impl<T> fmt::Display for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl<T> PartialEq for Query<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> From<Query<T>> for DynQuery {
    fn from(query: Query<T>) -> Self {
        query.into_dyn()
    }
}
