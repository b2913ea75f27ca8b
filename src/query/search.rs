//! Search predicate builder.
//!
//! Every descriptor field other than the listing fields is a search candidate.
//! A candidate becomes a filter when it carries a non-default value and the
//! element shape has a property with the same name. The comparison operator
//! follows the field name:
//!
//! | field name (lowercased) | operator          |
//! |-------------------------|-------------------|
//! | contains `from`         | `>=`              |
//! | contains `to`           | `<=`              |
//! | text property           | substring match   |
//! | anything else           | `==`              |
//!
//! Filters are appended in field declaration order and combine with AND.

use crate::query::clause::{Clause, Operator, Predicate};
use crate::query::descriptor::{Descriptor, RECOGNIZED_FIELDS};
use crate::query::error::QueryError;
use crate::query::handle::{DynQuery, Query};
use crate::value::coerce::coerce;
use crate::value::{Value, ValueKind};

/// Pick the comparison operator for a search field.
pub fn select_operator(field: &str, kind: ValueKind) -> Operator {
    let name = field.to_lowercase();
    if name.contains("from") {
        Operator::GreaterOrEqual
    } else if name.contains("to") {
        Operator::LessOrEqual
    } else if kind == ValueKind::Text {
        Operator::Contains
    } else {
        Operator::Equal
    }
}

impl DynQuery {
    /// Append one filter per matching search field of `request`.
    pub fn build_search<D: Descriptor + ?Sized>(&self, request: &D) -> DynQuery {
        let shape = self.shape();
        let mut predicates = Vec::new();

        for (name, raw) in request.fields().iter() {
            if RECOGNIZED_FIELDS.contains(&name) {
                continue;
            }
            let Some(property) = shape.property(name) else {
                log::debug!("build_search: [{name}] has no property on [{}]", shape.name);
                continue;
            };
            let value = coerce(raw, property.kind).into_inner();
            if raw.is_default() || value.is_default() {
                log::debug!("build_search: [{name}] has no value, skipped");
                continue;
            }
            predicates.push(Clause::Filter(Predicate {
                property: property.name.to_string(),
                operator: select_operator(name, property.kind),
                value,
            }));
        }

        if predicates.is_empty() {
            return self.clone();
        }
        self.push_all(predicates)
    }

    /// Restrict to the element whose `id` property equals `id`.
    pub fn build_single(&self, id: impl Into<Value>) -> Result<DynQuery, QueryError> {
        let shape = self.shape();
        let property = shape.property("id").ok_or(QueryError::PropertyNotFound {
            operation: "build_single",
            property: "id".to_string(),
            shape: shape.name,
        })?;
        let value = coerce(&id.into(), property.kind).into_inner();
        Ok(self.filter(Predicate::equal(property.name, value)))
    }

    /// Append an arbitrary filter.
    pub fn filter(&self, predicate: Predicate) -> DynQuery {
        self.push(Clause::Filter(predicate))
    }
}

impl<T> Query<T> {
    pub fn build_search<D: Descriptor + ?Sized>(&self, request: &D) -> Query<T> {
        self.map_dyn(|q| q.build_search(request))
    }

    pub fn build_single(&self, id: impl Into<Value>) -> Result<Query<T>, QueryError> {
        Ok(Query::from_dyn(self.as_dyn().build_single(id)?))
    }

    pub fn filter(&self, predicate: Predicate) -> Query<T> {
        self.map_dyn(|q| q.filter(predicate))
    }
}
