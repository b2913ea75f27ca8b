//! Relaxed read scopes.
//!
//! A [`ReadScope`] wraps one [`ReadSession`] for the duration of a single
//! executor call. It is released exactly once: committed by
//! [`ReadScope::complete`], rolled back by [`ReadScope::abandon`], or rolled
//! back on drop when neither ran (early return, panic unwinding).

use crate::config::ReadOptions;
use crate::executor::{LifeError, QueryEngine, ReadSession};
use serde::Deserialize;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use crate::observability::tracing_helpers;

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Read uncommitted (PostgreSQL runs it as read committed)
    ReadUncommitted,
    /// Read committed
    ReadCommitted,
    /// Repeatable read
    RepeatableRead,
    /// Serializable
    Serializable,
}

impl IsolationLevel {
    /// Convert to PostgreSQL SQL syntax
    pub fn to_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// How a read scope was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Committed,
    RolledBack,
}

/// A bounded read transaction around one executor call.
pub struct ReadScope<S: ReadSession> {
    session: S,
    operation: &'static str,
    started: Instant,
    timeout: Duration,
    released: bool,
}

impl<S: ReadSession> ReadScope<S> {
    /// Open a read session on `engine` with the configured isolation level.
    pub fn begin<E>(engine: &E, options: &ReadOptions, operation: &'static str) -> Result<Self, LifeError>
    where
        E: QueryEngine<Session = S>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::begin_read_span(options.isolation_level.to_sql()).entered();

        let session = engine.begin_read(options)?;
        log::debug!(
            "{operation}: read scope opened ({}, {}ms)",
            options.isolation_level.to_sql(),
            options.timeout_ms
        );
        Ok(Self {
            session,
            operation,
            started: Instant::now(),
            timeout: options.timeout(),
            released: false,
        })
    }

    pub fn session(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Commit the scope. A scope that outlived its timeout is rolled back
    /// instead and reports [`LifeError::Timeout`].
    pub fn complete(mut self) -> Result<Release, LifeError> {
        let elapsed = self.elapsed();
        if elapsed > self.timeout {
            self.release(Release::RolledBack)?;
            return Err(LifeError::Timeout {
                elapsed,
                limit: self.timeout,
            });
        }
        self.release(Release::Committed)
    }

    /// Roll the scope back.
    pub fn abandon(mut self) -> Result<Release, LifeError> {
        self.release(Release::RolledBack)
    }

    fn release(&mut self, how: Release) -> Result<Release, LifeError> {
        // marked first so a failing commit/rollback is not retried from drop
        self.released = true;
        match how {
            Release::Committed => self.session.commit()?,
            Release::RolledBack => self.session.rollback()?,
        }
        log::debug!("{}: read scope {:?}", self.operation, how);
        Ok(how)
    }
}

impl<S: ReadSession> Drop for ReadScope<S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        log::warn!("{}: read scope dropped without release, rolling back", self.operation);
        if let Err(e) = self.release(Release::RolledBack) {
            log::warn!("{}: rollback on drop failed: {e}", self.operation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngine;

    #[test]
    fn test_isolation_level_to_sql() {
        assert_eq!(IsolationLevel::ReadUncommitted.to_sql(), "READ UNCOMMITTED");
        assert_eq!(IsolationLevel::ReadCommitted.to_sql(), "READ COMMITTED");
        assert_eq!(IsolationLevel::RepeatableRead.to_sql(), "REPEATABLE READ");
        assert_eq!(IsolationLevel::Serializable.to_sql(), "SERIALIZABLE");
    }

    #[test]
    fn test_complete_commits_once() {
        let engine = MemoryEngine::new();
        let scope = ReadScope::begin(&engine, &ReadOptions::default(), "test").unwrap();
        assert_eq!(scope.complete().unwrap(), Release::Committed);
        let stats = engine.stats();
        assert_eq!((stats.opened, stats.committed, stats.rolled_back), (1, 1, 0));
    }

    #[test]
    fn test_drop_rolls_back_once() {
        let engine = MemoryEngine::new();
        {
            let _scope = ReadScope::begin(&engine, &ReadOptions::default(), "test").unwrap();
        }
        let stats = engine.stats();
        assert_eq!((stats.opened, stats.committed, stats.rolled_back), (1, 0, 1));
    }

    #[test]
    fn test_overrun_rolls_back() {
        let engine = MemoryEngine::new();
        let options = ReadOptions::new(IsolationLevel::ReadUncommitted, Duration::ZERO);
        let scope = ReadScope::begin(&engine, &options, "test").unwrap();
        std::thread::sleep(Duration::from_millis(2));
        assert!(matches!(scope.complete(), Err(LifeError::Timeout { .. })));
        let stats = engine.stats();
        assert_eq!((stats.committed, stats.rolled_back), (0, 1));
    }
}
