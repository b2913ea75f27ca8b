//! Build-time query errors.
//!
//! These are the structural failures that make a requested build operation
//! meaningless. Each variant carries the operation name and the offending
//! parameter. Best-effort coercion failures and optional-field misses never
//! show up here; they are absorbed where they happen.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No member of the container matches the name fragment.
    CollectionNotFound { container: String, fragment: String },
    /// More than one member matches the fragment and none matches it exactly.
    AmbiguousCollection {
        container: String,
        fragment: String,
        candidates: Vec<String>,
    },
    /// A recognized listing field is absent from the descriptor.
    MissingDescriptorField {
        operation: &'static str,
        field: &'static str,
    },
    /// No property could be resolved for ordering.
    MissingOrderProperty {
        operation: &'static str,
        column: String,
        shape: &'static str,
    },
    /// A named property required by the operation does not exist.
    PropertyNotFound {
        operation: &'static str,
        property: String,
        shape: &'static str,
    },
    /// The projection target declares no fields.
    EmptyProjection {
        operation: &'static str,
        shape: &'static str,
    },
    /// A projection binding could not be constructed.
    BindingFailure {
        operation: &'static str,
        field: &'static str,
        reason: String,
    },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::CollectionNotFound {
                container,
                fragment,
            } => write!(
                f,
                "collection not found in [{container}] for fragment [{fragment}]"
            ),
            QueryError::AmbiguousCollection {
                container,
                fragment,
                candidates,
            } => write!(
                f,
                "collection fragment [{fragment}] is ambiguous in [{container}]: matches [{}]",
                candidates.join(", ")
            ),
            QueryError::MissingDescriptorField { operation, field } => write!(
                f,
                "{operation}: argument is null at [descriptor].[{field}]"
            ),
            QueryError::MissingOrderProperty {
                operation,
                column,
                shape,
            } => write!(
                f,
                "{operation}: no order property resolved on [{shape}] for column [{column}]"
            ),
            QueryError::PropertyNotFound {
                operation,
                property,
                shape,
            } => write!(f, "{operation}: property [{property}] not found on [{shape}]"),
            QueryError::EmptyProjection { operation, shape } => {
                write!(f, "{operation}: projection target [{shape}] declares no fields")
            }
            QueryError::BindingFailure {
                operation,
                field,
                reason,
            } => write!(f, "{operation}: cannot bind [{field}]: {reason}"),
        }
    }
}

impl std::error::Error for QueryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_not_found_message() {
        let err = QueryError::CollectionNotFound {
            container: "ShopContext".to_string(),
            fragment: "ABC".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "collection not found in [ShopContext] for fragment [ABC]"
        );
    }

    #[test]
    fn test_messages_carry_operation_and_parameter() {
        let err = QueryError::MissingDescriptorField {
            operation: "build_listing",
            field: "page_size",
        };
        let msg = err.to_string();
        assert!(msg.starts_with("build_listing"));
        assert!(msg.contains("[page_size]"));

        let err = QueryError::BindingFailure {
            operation: "build_select",
            field: "name",
            reason: "text cannot bind to bool".to_string(),
        };
        assert!(err.to_string().contains("[name]"));
    }
}
