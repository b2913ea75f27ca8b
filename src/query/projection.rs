//! Projection builder.

use crate::query::clause::{Binding, BindingSource, Clause, Projection};
use crate::query::error::QueryError;
use crate::query::handle::{DynQuery, Query};
use crate::shape::{Shape, ShapeInfo};

const OPERATION: &str = "build_select";

/// Bind every field of `target` from the same-named field of `source`, or to
/// its zero value when `source` has no such field or its kind does not fit.
///
/// Fails when `target` has no fields or declares a field name twice.
pub fn bind(source: ShapeInfo, target: ShapeInfo) -> Result<Projection, QueryError> {
    if target.is_empty() {
        return Err(QueryError::EmptyProjection {
            operation: OPERATION,
            shape: target.name,
        });
    }

    let bindings = target
        .properties
        .iter()
        .enumerate()
        .map(|(i, field)| {
            if target.properties[..i].iter().any(|p| p.name == field.name) {
                return Err(QueryError::BindingFailure {
                    operation: OPERATION,
                    field: field.name,
                    reason: format!("[{}] is declared twice on {}", field.name, target.name),
                });
            }
            let bound = match source.property(field.name) {
                Some(from) if field.kind.accepts(from.kind) => BindingSource::Field(from.name),
                Some(from) => {
                    log::debug!(
                        "{OPERATION}: {}.{} [{}] does not fit {}.{} [{}], binding zero value",
                        source.name,
                        from.name,
                        from.kind,
                        target.name,
                        field.name,
                        field.kind
                    );
                    BindingSource::Default(field.kind.zero())
                }
                None => {
                    log::debug!(
                        "{OPERATION}: [{}] missing on [{}], binding zero value",
                        field.name,
                        source.name
                    );
                    BindingSource::Default(field.kind.zero())
                }
            };
            Ok(Binding {
                target: field.name,
                source: bound,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Projection {
        source,
        target,
        bindings,
    })
}

impl DynQuery {
    /// Project the current elements onto `target`.
    pub fn build_select(&self, target: ShapeInfo) -> Result<DynQuery, QueryError> {
        let projection = bind(self.shape(), target)?;
        Ok(self.reshape(Clause::Project(projection), target))
    }
}

impl<T> Query<T> {
    /// Project the current elements onto `R`.
    pub fn build_select<R: Shape>(&self) -> Result<Query<R>, QueryError> {
        let next = self.as_dyn().build_select(ShapeInfo::of::<R>())?;
        Ok(Query::from_dyn(next))
    }
}
