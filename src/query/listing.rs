//! Listing composer: order plus paging from one descriptor.

use crate::query::descriptor::{read_descriptor, Descriptor};
use crate::query::error::QueryError;
use crate::query::handle::{DynQuery, Query};

impl DynQuery {
    /// Read the listing fields of `descriptor`, then append the order clause
    /// followed by the paging clauses.
    pub fn build_listing<D: Descriptor + ?Sized>(&self, descriptor: &D) -> Result<DynQuery, QueryError> {
        let parsed = read_descriptor(descriptor, "build_listing")?;
        Ok(self
            .build_order(&parsed.column_order, parsed.is_desc)?
            .build_paging(parsed.offset, parsed.size))
    }
}

impl<T> Query<T> {
    pub fn build_listing<D: Descriptor + ?Sized>(&self, descriptor: &D) -> Result<Query<T>, QueryError> {
        Ok(Query::from_dyn(self.as_dyn().build_listing(descriptor)?))
    }
}
