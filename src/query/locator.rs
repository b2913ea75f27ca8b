//! Collection lookup by name fragment.
//!
//! A [`Container`] exposes its collections as a list of [`Collection`]
//! descriptions. Lookup lowercases both sides and picks the member whose name
//! contains the fragment.

use crate::query::error::QueryError;
use crate::query::handle::{DynQuery, Query};
use crate::shape::{Shape, ShapeInfo};
use std::any::TypeId;

/// One named, typed collection exposed by a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub name: String,
    pub shape: ShapeInfo,
    element: TypeId,
}

impl Collection {
    pub fn of<T: Shape + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: ShapeInfo::of::<T>(),
            element: TypeId::of::<T>(),
        }
    }

    /// Whether the collection yields elements of type `T`.
    pub fn holds<T: 'static>(&self) -> bool {
        self.element == TypeId::of::<T>()
    }
}

/// Any object exposing named collections.
pub trait Container {
    /// Name used in lookup failures. Defaults to the unqualified type name.
    fn container_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn collections(&self) -> Vec<Collection>;
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn locate<C: Container + ?Sized>(container: &C, fragment: &str) -> Result<Collection, QueryError> {
    let needle = fragment.to_lowercase();
    let mut matches: Vec<Collection> = container
        .collections()
        .into_iter()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .collect();

    match matches.len() {
        0 => Err(QueryError::CollectionNotFound {
            container: container.container_name().to_string(),
            fragment: fragment.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        _ => {
            if let Some(pos) = matches
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(fragment))
            {
                return Ok(matches.swap_remove(pos));
            }
            Err(QueryError::AmbiguousCollection {
                container: container.container_name().to_string(),
                fragment: fragment.to_string(),
                candidates: matches.into_iter().map(|c| c.name).collect(),
            })
        }
    }
}

/// Locate a collection and type its handle as `T`.
///
/// Returns `Ok(None)` when the located collection does not hold `T`.
pub fn get_collection<T, C>(container: &C, fragment: &str) -> Result<Option<Query<T>>, QueryError>
where
    T: Shape + 'static,
    C: Container + ?Sized,
{
    let collection = locate(container, fragment)?;
    if !collection.holds::<T>() {
        log::debug!(
            "collection [{}] in [{}] does not hold [{}]",
            collection.name,
            container.container_name(),
            T::NAME
        );
        return Ok(None);
    }
    Ok(Some(Query::new(collection.name)))
}

/// Locate a collection without a static element type.
pub fn get_dyn_collection<C: Container + ?Sized>(
    container: &C,
    fragment: &str,
) -> Result<DynQuery, QueryError> {
    let collection = locate(container, fragment)?;
    Ok(DynQuery::new(collection.name, collection.shape))
}
