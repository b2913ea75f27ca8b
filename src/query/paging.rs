//! Paging clause builder.
//!
//! `build_paging` always appends a fresh `Skip`/`Take` pair. Applied to a
//! handle that is already paged, the new pair pages within the previous page
//! instead of replacing it.

use crate::query::clause::Clause;
use crate::query::handle::{DynQuery, Query};

impl DynQuery {
    /// Append `skip(offset)` then `take(size)`. A size of 0 yields no rows.
    pub fn build_paging(&self, offset: u64, size: u16) -> DynQuery {
        self.push_all([Clause::Skip(offset), Clause::Take(u64::from(size))])
    }
}

impl<T> Query<T> {
    pub fn build_paging(&self, offset: u64, size: u16) -> Query<T> {
        self.map_dyn(|q| q.build_paging(offset, size))
    }
}
