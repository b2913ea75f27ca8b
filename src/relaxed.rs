//! Lock-relaxed execution.
//!
//! [`RelaxedExecutor`] runs each call inside its own [`ReadScope`] opened with
//! the configured isolation level (`READ UNCOMMITTED` by default) and bounded
//! by the configured timeout. The scope is committed when the call succeeds
//! and rolled back on every other exit path.
//!
//! Every call takes an optional extra predicate, appended as a final filter,
//! and an optional cancellation token checked by the engine. Engine faults
//! come back wrapped in [`LifeError::Operation`] naming the call; cancellation
//! and timeouts are returned as they are.

use crate::config::ReadOptions;
use crate::executor::{LifeError, QueryEngine, ReadSession};
use crate::model::PagedResult;
use crate::query::clause::{Clause, Predicate};
use crate::query::descriptor::Descriptor;
use crate::query::lower::with_predicate;
use crate::query::{DynQuery, Query};
use crate::shape::{FromRecord, Record};
use crate::transaction::ReadScope;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use crate::observability::tracing_helpers;

/// Executor running queries in relaxed read scopes.
#[derive(Debug, Clone)]
pub struct RelaxedExecutor<E> {
    engine: E,
    options: ReadOptions,
}

impl<E: QueryEngine> RelaxedExecutor<E> {
    pub fn new(engine: E, options: ReadOptions) -> Self {
        Self { engine, options }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Materialize every element.
    pub fn to_list<T: FromRecord>(
        &self,
        query: &Query<T>,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<T>, LifeError> {
        self.run("to_list", query.as_dyn(), predicate, cancel, |session, query| {
            session.fetch(query, cancel)?.iter().map(decode).collect()
        })
    }

    /// First element, or `None` when nothing matches.
    pub fn first<T: FromRecord>(
        &self,
        query: &Query<T>,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<T>, LifeError> {
        self.run("first", query.as_dyn(), predicate, cancel, |session, query| {
            let query = query.push(Clause::Take(1));
            session.fetch(&query, cancel)?.first().map(decode).transpose()
        })
    }

    /// Element count narrowed to `i32`.
    pub fn count<T>(
        &self,
        query: &Query<T>,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<i32, LifeError> {
        self.count_dyn(query.as_dyn(), predicate, cancel)
    }

    pub fn long_count<T>(
        &self,
        query: &Query<T>,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<i64, LifeError> {
        self.long_count_dyn(query.as_dyn(), predicate, cancel)
    }

    /// Element count as `u64`; a negative engine count is an error.
    pub fn ulong_count<T>(
        &self,
        query: &Query<T>,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<u64, LifeError> {
        self.ulong_count_dyn(query.as_dyn(), predicate, cancel)
    }

    /// One page of `query` as described by `descriptor`, together with the
    /// count of all elements before paging.
    ///
    /// The extra predicate narrows the elements before ordering and paging,
    /// so `total` and `data` describe the same set. The count and the page
    /// are read in two separate scopes.
    pub fn to_paged<T, D>(
        &self,
        query: &Query<T>,
        descriptor: &D,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<PagedResult<T>, LifeError>
    where
        T: FromRecord,
        D: Descriptor + ?Sized,
    {
        let filtered = match predicate {
            Some(p) => query.filter(p.clone()),
            None => query.clone(),
        };
        let page = filtered.build_listing(descriptor)?;
        let total = self.ulong_count(&filtered, None, cancel)?;
        let data = self.to_list(&page, None, cancel)?;
        Ok(PagedResult::new(data, total))
    }

    pub fn to_list_dyn(
        &self,
        query: &DynQuery,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Record>, LifeError> {
        self.run("to_list", query, predicate, cancel, |session, query| session.fetch(query, cancel))
    }

    pub fn first_dyn(
        &self,
        query: &DynQuery,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<Record>, LifeError> {
        self.run("first", query, predicate, cancel, |session, query| {
            let query = query.push(Clause::Take(1));
            Ok(session.fetch(&query, cancel)?.into_iter().next())
        })
    }

    pub fn count_dyn(
        &self,
        query: &DynQuery,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<i32, LifeError> {
        let count = self.run("count", query, predicate, cancel, |session, query| session.count(query, cancel))?;
        i32::try_from(count).map_err(|_| LifeError::CountOverflow(count))
    }

    pub fn long_count_dyn(
        &self,
        query: &DynQuery,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<i64, LifeError> {
        self.run("long_count", query, predicate, cancel, |session, query| session.count(query, cancel))
    }

    pub fn ulong_count_dyn(
        &self,
        query: &DynQuery,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
    ) -> Result<u64, LifeError> {
        let count = self.run("ulong_count", query, predicate, cancel, |session, query| {
            session.count(query, cancel)
        })?;
        u64::try_from(count).map_err(|_| LifeError::NegativeCount(count))
    }

    fn run<R, F>(
        &self,
        operation: &'static str,
        query: &DynQuery,
        predicate: Option<&Predicate>,
        cancel: Option<&CancellationToken>,
        f: F,
    ) -> Result<R, LifeError>
    where
        F: FnOnce(&mut E::Session, &DynQuery) -> Result<R, LifeError>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::relaxed_read_span(operation, query.collection()).entered();

        let query = with_predicate(query, predicate);
        log::debug!("{operation}: {query}");
        self.run_scoped(operation, &query, f).map_err(|e| {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                log::debug!("{operation}: cancelled");
            }
            e.in_operation(operation)
        })
    }

    fn run_scoped<R, F>(&self, operation: &'static str, query: &DynQuery, f: F) -> Result<R, LifeError>
    where
        F: FnOnce(&mut E::Session, &DynQuery) -> Result<R, LifeError>,
    {
        let mut scope = ReadScope::begin(&self.engine, &self.options, operation)?;
        match f(scope.session(), query) {
            Ok(value) => {
                scope.complete()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = scope.abandon() {
                    log::warn!("{operation}: rollback after failure failed: {rollback}");
                }
                Err(e)
            }
        }
    }
}

fn decode<T: FromRecord>(record: &Record) -> Result<T, LifeError> {
    T::from_record(record).map_err(|e| LifeError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngine;
    use crate::query::clause::Operator;
    use crate::shape::{Property, Shape, ShapeInfo};
    use crate::transaction::IsolationLevel;
    use crate::value::ValueKind;
    use std::time::Duration;

    struct Item;

    impl Shape for Item {
        const NAME: &'static str = "Item";
        const PROPERTIES: &'static [Property] = &[
            Property::new("id", ValueKind::UInt),
            Property::new("name", ValueKind::Text),
        ];
    }

    fn executor(engine: MemoryEngine) -> RelaxedExecutor<MemoryEngine> {
        RelaxedExecutor::new(engine, ReadOptions::default())
    }

    fn items() -> DynQuery {
        DynQuery::new("items", ShapeInfo::of::<Item>())
    }

    fn engine() -> MemoryEngine {
        let rows = (1u64..=4)
            .map(|id| Record::new().with("id", id).with("name", format!("item {id}")))
            .collect();
        MemoryEngine::new().with_collection("items", rows)
    }

    #[test]
    fn test_predicate_applies_before_first() {
        let exec = executor(engine());
        let predicate = Predicate::new("id", Operator::GreaterOrEqual, 3u64);
        let first = exec.first_dyn(&items(), Some(&predicate), None).unwrap();
        assert_eq!(first.and_then(|r| r.get("id").cloned()), Some(3u64.into()));
        assert_eq!(exec.engine().stats().committed, 1);
    }

    #[test]
    fn test_first_on_empty_result() {
        let exec = executor(engine());
        let predicate = Predicate::equal("name", "missing");
        assert_eq!(exec.first_dyn(&items(), Some(&predicate), None).unwrap(), None);
    }

    #[test]
    fn test_fault_is_wrapped_and_rolled_back() {
        let exec = executor(engine().fail_with("deadlock detected"));
        let err = exec.to_list_dyn(&items(), None, None).unwrap_err();
        assert!(matches!(err, LifeError::Operation { operation: "to_list", .. }));
        let stats = exec.engine().stats();
        assert_eq!((stats.opened, stats.committed, stats.rolled_back), (1, 0, 1));
    }

    #[test]
    fn test_count_narrowing() {
        let exec = executor(engine().report_count(i64::from(i32::MAX) + 1));
        assert!(matches!(exec.count_dyn(&items(), None, None), Err(LifeError::CountOverflow(_))));
        assert_eq!(exec.long_count_dyn(&items(), None, None).unwrap(), i64::from(i32::MAX) + 1);

        let exec = executor(engine().report_count(-1));
        assert!(matches!(exec.ulong_count_dyn(&items(), None, None), Err(LifeError::NegativeCount(-1))));
    }

    #[test]
    fn test_overrun_reports_timeout() {
        let options = ReadOptions::new(IsolationLevel::ReadUncommitted, Duration::ZERO);
        let exec = RelaxedExecutor::new(engine().with_latency(Duration::from_millis(2)), options);
        assert!(matches!(exec.long_count_dyn(&items(), None, None), Err(LifeError::Timeout { .. })));
        assert_eq!(exec.engine().stats().rolled_back, 1);
    }
}
