mod common;

use common::{engine, executor, products, Product};
use dynaquery::memory::MemoryEngine;
use dynaquery::{
    IsolationLevel, LifeError, Query, QueryError, ReadOptions, RelaxedExecutor, Shape, ShapeInfo,
};
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Shape, Clone, Debug, PartialEq)]
struct Summary {
    id: u64,
    name: String,
    rating: f64,
}

#[derive(Shape, Clone, Debug, PartialEq)]
struct NumberedName {
    id: u64,
    name: i64,
}

#[derive(Shape, Clone, Debug)]
struct Nothing {}

fn products_query() -> Query<Product> {
    Query::<Product>::new("Products").build_order("", true).unwrap()
}

#[test]
fn test_success_commits_once() {
    let exec = executor(engine());
    let all = exec.to_list(&products_query(), None, None).unwrap();
    assert_eq!(all.len(), 30);
    let stats = exec.engine().stats();
    assert_eq!((stats.opened, stats.committed, stats.rolled_back), (1, 1, 0));
}

#[test]
fn test_fault_rolls_back_once_and_keeps_cause() {
    let exec = executor(engine().fail_with("connection reset"));
    let err = exec.first(&products_query(), None, None).unwrap_err();
    assert_eq!(err.to_string(), "first: Query error: connection reset");
    assert!(matches!(err.root(), LifeError::QueryError(_)));
    let stats = exec.engine().stats();
    assert_eq!((stats.opened, stats.committed, stats.rolled_back), (1, 0, 1));
}

#[test]
fn test_cancelled_token_rolls_back() {
    let exec = executor(engine());
    let token = CancellationToken::new();
    token.cancel();
    let err = exec.long_count(&products_query(), None, Some(&token)).unwrap_err();
    assert!(matches!(err, LifeError::Cancelled));
    let stats = exec.engine().stats();
    assert_eq!((stats.opened, stats.committed, stats.rolled_back), (1, 0, 1));
}

#[test]
fn test_cancel_during_execution() {
    let exec = executor(engine().with_latency(Duration::from_millis(100)));
    let token = CancellationToken::new();
    let canceller = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            token.cancel();
        })
    };
    let result = exec.to_list(&products_query(), None, Some(&token));
    canceller.join().unwrap();
    assert!(matches!(result, Err(LifeError::Cancelled)));
    assert_eq!(exec.engine().stats().rolled_back, 1);
}

#[test]
fn test_overrun_times_out() {
    let options = ReadOptions::new(IsolationLevel::ReadUncommitted, Duration::ZERO);
    let exec = RelaxedExecutor::new(engine().with_latency(Duration::from_millis(5)), options);
    let err = exec.to_list(&products_query(), None, None).unwrap_err();
    assert!(matches!(err, LifeError::Timeout { .. }));
    let stats = exec.engine().stats();
    assert_eq!((stats.committed, stats.rolled_back), (0, 1));
}

#[test]
fn test_every_call_owns_a_scope() {
    let exec = executor(engine());
    let query = products_query();
    exec.to_list(&query, None, None).unwrap();
    exec.first(&query, None, None).unwrap();
    exec.count(&query, None, None).unwrap();
    exec.long_count(&query, None, None).unwrap();
    exec.ulong_count(&query, None, None).unwrap();
    let stats = exec.engine().stats();
    assert_eq!((stats.opened, stats.committed, stats.rolled_back), (5, 5, 0));
}

#[test]
fn test_count_variants() {
    let exec = executor(engine());
    let query = products_query().build_paging(25, 10);
    assert_eq!(exec.count(&query, None, None).unwrap(), 5);
    assert_eq!(exec.long_count(&query, None, None).unwrap(), 5);
    assert_eq!(exec.ulong_count(&query, None, None).unwrap(), 5);
}

#[test]
fn test_negative_count_is_rejected() {
    let exec = executor(engine().report_count(-2));
    assert!(matches!(
        exec.ulong_count(&products_query(), None, None),
        Err(LifeError::NegativeCount(-2))
    ));
    assert_eq!(exec.long_count(&products_query(), None, None).unwrap(), -2);
}

#[test]
fn test_first_on_empty_collection() {
    let exec = executor(MemoryEngine::new().with_rows::<Product>("Products", &[]));
    assert_eq!(exec.first(&products_query(), None, None).unwrap(), None);
    assert_eq!(exec.count(&products_query(), None, None).unwrap(), 0);
}

#[test]
fn test_projection_binds_missing_fields_to_zero() {
    let source = products(3);
    let exec = executor(MemoryEngine::new().with_rows("Products", &source));
    let query = products_query().build_select::<Summary>().unwrap();
    assert_eq!(query.shape(), ShapeInfo::of::<Summary>());

    let summaries = exec.to_list(&query, None, None).unwrap();
    let expected: Vec<Summary> = source
        .iter()
        .map(|p| Summary {
            id: p.id,
            name: p.name.clone(),
            rating: 0.0,
        })
        .collect();
    assert_eq!(summaries, expected);
}

#[test]
fn test_projection_kind_mismatch_binds_zero() {
    let exec = executor(MemoryEngine::new().with_rows("Products", &products(2)));
    let query = products_query().build_select::<NumberedName>().unwrap();
    let rows = exec.to_list(&query, None, None).unwrap();
    assert_eq!(
        rows,
        vec![NumberedName { id: 1, name: 0 }, NumberedName { id: 2, name: 0 }]
    );
}

#[test]
fn test_empty_projection_fails() {
    let err = products_query().build_select::<Nothing>().unwrap_err();
    assert_eq!(
        err,
        QueryError::EmptyProjection {
            operation: "build_select",
            shape: "Nothing",
        }
    );
}

#[test]
fn test_build_errors_are_not_engine_faults() {
    let err: LifeError = products_query().build_select::<Nothing>().unwrap_err().into();
    assert!(matches!(err, LifeError::Build(_)));
}

#[test]
fn test_concurrent_coroutines_each_own_a_scope() {
    may::config().set_stack_size(0x8000);
    let exec = executor(engine());
    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let exec = exec.clone();
            may::go!(move || {
                let query = products_query().build_paging(i, 5);
                exec.to_list(&query, None, None).map(|page| page.first().map(|p| p.id))
            })
        })
        .collect();
    let firsts: Vec<Option<u64>> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert_eq!(firsts, (1..=8).map(Some).collect::<Vec<_>>());
    let stats = exec.engine().stats();
    assert_eq!((stats.opened, stats.committed, stats.rolled_back), (8, 8, 0));
}
