//! Tracing spans for relaxed reads.
//!
//! Compiled only with the `tracing` feature. Call sites enter the span for the
//! duration of the work: `let _span = relaxed_read_span(op, coll).entered();`

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    /// One executor call: operation name plus target collection.
    pub fn relaxed_read_span(operation: &'static str, collection: &str) -> Span {
        tracing::info_span!("dynaquery.relaxed_read", operation, collection)
    }

    /// Opening a read scope.
    pub fn begin_read_span(isolation: &'static str) -> Span {
        tracing::debug_span!("dynaquery.begin_read", isolation)
    }

    /// One SQL statement sent to the server.
    pub fn execute_query_span(sql: &str) -> Span {
        tracing::debug_span!("dynaquery.execute_query", sql)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_spans_can_be_entered() {
            let _read = relaxed_read_span("to_list", "items").entered();
            let _begin = begin_read_span("READ UNCOMMITTED").entered();
            let _sql = execute_query_span("SELECT 1").entered();
        }
    }
}
