//! In-memory query engine.
//!
//! [`MemoryEngine`] evaluates the clause IR directly over owned [`Record`]s.
//! It backs the test suite and serves as the reference semantics for
//! [`crate::query::lower`]: filters compare with [`Value::compare`], orderings
//! are stable with `NULL` sorting last on ascending order, and `Contains`
//! matches the text rendering of the operand.
//!
//! The engine counts every session it opens, commits and rolls back, so
//! callers can verify that each read scope is released exactly once.

use crate::config::ReadOptions;
use crate::executor::{check_cancelled, LifeError, QueryEngine, ReadSession};
use crate::query::clause::{BindingSource, Clause, Direction, Operator, Predicate, Projection};
use crate::query::lower::contains_text;
use crate::query::DynQuery;
use crate::shape::{IntoRecord, Record};
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Snapshot of the session counters of a [`MemoryEngine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub opened: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
}

/// Engine over named collections of records.
///
/// ```
/// use dynaquery::memory::MemoryEngine;
/// use dynaquery::{Query, ReadOptions, RelaxedExecutor, Shape};
///
/// #[derive(Shape, Clone, Debug, PartialEq)]
/// struct Item {
///     id: u64,
///     name: String,
/// }
///
/// let engine = MemoryEngine::new().with_rows(
///     "items",
///     &[Item { id: 2, name: "b".into() }, Item { id: 1, name: "a".into() }],
/// );
/// let executor = RelaxedExecutor::new(engine, ReadOptions::default());
///
/// let query = Query::<Item>::new("items").build_order("", true)?;
/// let items = executor.to_list(&query, None, None)?;
/// assert_eq!(items[0].id, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    collections: Arc<HashMap<String, Vec<Record>>>,
    counters: Arc<Counters>,
    latency: Duration,
    fault: Option<String>,
    reported_count: Option<i64>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a collection of raw records.
    pub fn with_collection(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        Arc::make_mut(&mut self.collections).insert(name.into(), records);
        self
    }

    /// Add (or replace) a collection from typed rows.
    pub fn with_rows<T: IntoRecord>(self, name: impl Into<String>, rows: &[T]) -> Self {
        let records = rows.iter().map(IntoRecord::to_record).collect();
        self.with_collection(name, records)
    }

    /// Sleep this long before evaluating each statement.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every statement fail with `message`.
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.fault = Some(message.into());
        self
    }

    /// Report `count` from every count statement instead of the real count.
    pub fn report_count(mut self, count: i64) -> Self {
        self.reported_count = Some(count);
        self
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            opened: self.counters.opened.load(AtomicOrdering::SeqCst),
            committed: self.counters.committed.load(AtomicOrdering::SeqCst),
            rolled_back: self.counters.rolled_back.load(AtomicOrdering::SeqCst),
        }
    }
}

impl QueryEngine for MemoryEngine {
    type Session = MemorySession;

    fn begin_read(&self, _options: &ReadOptions) -> Result<MemorySession, LifeError> {
        self.counters.opened.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(MemorySession {
            engine: self.clone(),
        })
    }
}

/// Read session opened by [`MemoryEngine`].
#[derive(Debug)]
pub struct MemorySession {
    engine: MemoryEngine,
}

impl MemorySession {
    fn evaluate(&self, query: &DynQuery, cancel: Option<&CancellationToken>) -> Result<Vec<Record>, LifeError> {
        check_cancelled(cancel)?;
        if !self.engine.latency.is_zero() {
            std::thread::sleep(self.engine.latency);
        }
        if let Some(message) = &self.engine.fault {
            return Err(LifeError::QueryError(message.clone()));
        }

        let mut rows = self
            .engine
            .collections
            .get(query.collection())
            .cloned()
            .ok_or_else(|| LifeError::QueryError(format!("relation \"{}\" does not exist", query.collection())))?;

        for clause in query.clauses() {
            check_cancelled(cancel)?;
            apply(&mut rows, clause);
        }
        check_cancelled(cancel)?;
        Ok(rows)
    }
}

impl ReadSession for MemorySession {
    fn fetch(&mut self, query: &DynQuery, cancel: Option<&CancellationToken>) -> Result<Vec<Record>, LifeError> {
        self.evaluate(query, cancel)
    }

    fn count(&mut self, query: &DynQuery, cancel: Option<&CancellationToken>) -> Result<i64, LifeError> {
        let rows = self.evaluate(query, cancel)?;
        match self.engine.reported_count {
            Some(count) => Ok(count),
            None => i64::try_from(rows.len()).map_err(|e| LifeError::Other(e.to_string())),
        }
    }

    fn commit(&mut self) -> Result<(), LifeError> {
        self.engine.counters.committed.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), LifeError> {
        self.engine.counters.rolled_back.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

fn clamp(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn apply(rows: &mut Vec<Record>, clause: &Clause) {
    match clause {
        Clause::Filter(predicate) => rows.retain(|row| matches(predicate, row)),
        Clause::Order {
            property,
            direction,
        } => rows.sort_by(|a, b| {
            let ascending = order_values(a.get(property), b.get(property));
            match direction {
                Direction::Ascending => ascending,
                Direction::Descending => ascending.reverse(),
            }
        }),
        Clause::Skip(n) => {
            let n = clamp(*n).min(rows.len());
            rows.drain(..n);
        }
        Clause::Take(n) => rows.truncate(clamp(*n)),
        Clause::Project(projection) => {
            for row in rows.iter_mut() {
                *row = project(projection, row);
            }
        }
    }
}

fn matches(predicate: &Predicate, row: &Record) -> bool {
    let field = row.get(&predicate.property).unwrap_or(&Value::Null);
    if predicate.value.is_null() {
        return predicate.operator == Operator::Equal && field.is_null();
    }
    if field.is_null() {
        return false;
    }
    match predicate.operator {
        Operator::Equal => field.compare(&predicate.value) == Some(Ordering::Equal),
        Operator::GreaterOrEqual => matches!(
            field.compare(&predicate.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::LessOrEqual => matches!(
            field.compare(&predicate.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Contains => contains_text(field).contains(&contains_text(&predicate.value)),
    }
}

// NULL sorts after every value; incomparable pairs keep their order.
fn order_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

fn project(projection: &Projection, row: &Record) -> Record {
    projection
        .bindings
        .iter()
        .map(|binding| {
            let value = match &binding.source {
                BindingSource::Field(name) => row.get(name).cloned().unwrap_or(Value::Null),
                BindingSource::Default(value) => value.clone(),
            };
            (binding.target, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Property, Shape, ShapeInfo};
    use crate::value::ValueKind;

    struct Item;

    impl Shape for Item {
        const NAME: &'static str = "Item";
        const PROPERTIES: &'static [Property] = &[
            Property::new("id", ValueKind::UInt),
            Property::new("name", ValueKind::Text),
        ];
    }

    fn engine() -> MemoryEngine {
        let rows = [(3u64, "gamma"), (1, "alpha"), (2, "beta")]
            .into_iter()
            .map(|(id, name)| Record::new().with("id", id).with("name", name))
            .collect();
        MemoryEngine::new().with_collection("items", rows)
    }

    fn ids(rows: &[Record]) -> Vec<Value> {
        rows.iter().filter_map(|r| r.get("id").cloned()).collect()
    }

    #[test]
    fn test_order_skip_take() {
        let engine = engine();
        let mut session = engine.begin_read(&ReadOptions::default()).unwrap();
        let q = DynQuery::new("items", ShapeInfo::of::<Item>())
            .build_order("", false)
            .unwrap()
            .build_paging(1, 1);
        let rows = session.fetch(&q, None).unwrap();
        assert_eq!(ids(&rows), vec![Value::UInt(2)]);
    }

    #[test]
    fn test_contains_and_bounds() {
        let engine = engine();
        let mut session = engine.begin_read(&ReadOptions::default()).unwrap();
        let q = DynQuery::new("items", ShapeInfo::of::<Item>())
            .filter(Predicate::new("name", Operator::Contains, "a"))
            .filter(Predicate::new("id", Operator::LessOrEqual, 2i64));
        assert_eq!(session.count(&q, None).unwrap(), 2);
    }

    #[test]
    fn test_nulls_sort_last_ascending() {
        let mut rows = vec![
            Record::new().with("v", Value::Null),
            Record::new().with("v", 2i64),
            Record::new().with("v", 1i64),
        ];
        apply(
            &mut rows,
            &Clause::Order {
                property: "v",
                direction: Direction::Ascending,
            },
        );
        let values: Vec<_> = rows.iter().filter_map(|r| r.get("v").cloned()).collect();
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Null]);
    }

    #[test]
    fn test_unknown_collection_fails() {
        let engine = MemoryEngine::new();
        let mut session = engine.begin_read(&ReadOptions::default()).unwrap();
        let q = DynQuery::new("nothing", ShapeInfo::of::<Item>());
        assert!(matches!(session.fetch(&q, None), Err(LifeError::QueryError(_))));
    }

    #[test]
    fn test_cancelled_before_evaluation() {
        let engine = engine();
        let mut session = engine.begin_read(&ReadOptions::default()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let q = DynQuery::new("items", ShapeInfo::of::<Item>());
        assert!(matches!(session.fetch(&q, Some(&token)), Err(LifeError::Cancelled)));
    }
}
