//! Order clause builder.

use crate::query::clause::{Clause, Direction};
use crate::query::error::QueryError;
use crate::query::handle::{DynQuery, Query};
use crate::shape::{Property, ShapeInfo};

const OPERATION: &str = "build_order";

/// Resolve the property to order by.
///
/// A non-empty `column` must name a property exactly; an empty one looks for
/// the key property. Whatever that step yields is then replaced by the first
/// property whose lowercase name contains `"id"`, or the first declared
/// property when none does. An unknown non-empty column or a shape without
/// properties fails.
///
/// An empty column on a shape without a key property does not fail: it
/// resolves through the same `"id"` / first-property fallback.
///
/// ```
/// use dynaquery::{resolve_order_property, Shape, ShapeInfo};
///
/// #[derive(Shape)]
/// struct Row {
///     name: String,
///     item_id: u64,
/// }
///
/// let shape = ShapeInfo::of::<Row>();
/// assert_eq!(resolve_order_property("name", shape).unwrap().name, "item_id");
/// assert_eq!(resolve_order_property("", shape).unwrap().name, "item_id");
/// ```
pub fn resolve_order_property(
    column: &str,
    shape: ShapeInfo,
) -> Result<&'static Property, QueryError> {
    let missing = || QueryError::MissingOrderProperty {
        operation: OPERATION,
        column: column.to_string(),
        shape: shape.name,
    };

    if !column.is_empty() {
        shape.property(column).ok_or_else(missing)?;
    } else if shape.key_property().is_none() {
        log::debug!("{OPERATION}: no key property on [{}], using fallback", shape.name);
    }

    shape
        .properties
        .iter()
        .find(|p| p.name.to_lowercase().contains("id"))
        .or_else(|| shape.first_property())
        .ok_or_else(missing)
}

/// Direction selected by the listing flag: `true` orders ascending, `false`
/// orders descending.
pub fn direction_for(is_desc: bool) -> Direction {
    if is_desc {
        Direction::Ascending
    } else {
        Direction::Descending
    }
}

impl DynQuery {
    /// Append an order clause for `column` with the direction picked by
    /// [`direction_for`].
    pub fn build_order(&self, column: &str, is_desc: bool) -> Result<DynQuery, QueryError> {
        let property = resolve_order_property(column, self.shape())?;
        let direction = direction_for(is_desc);
        log::debug!(
            "{OPERATION}: [{}] column [{column}] resolved to [{}] {direction}",
            self.shape().name,
            property.name
        );
        Ok(self.push(Clause::Order {
            property: property.name,
            direction,
        }))
    }
}

impl<T> Query<T> {
    pub fn build_order(&self, column: &str, is_desc: bool) -> Result<Query<T>, QueryError> {
        let next = self.as_dyn().build_order(column, is_desc)?;
        Ok(Query::from_dyn(next))
    }
}
