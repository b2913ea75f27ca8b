//! Result envelopes returned to listing endpoints.

use serde::{Deserialize, Serialize};

/// A diagnostic attached to a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub code: String,
    pub item_name: String,
    pub exception: String,
    pub message: String,
}

impl Message {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Message describing `error`, with its display form as `exception`.
    pub fn from_error(code: impl Into<String>, item_name: impl Into<String>, error: &dyn std::error::Error) -> Self {
        Self {
            code: code.into(),
            item_name: item_name.into(),
            exception: error.to_string(),
            message: error.source().map(ToString::to_string).unwrap_or_default(),
        }
    }
}

/// One page of a listing plus the total element count before paging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            messages: Vec::new(),
        }
    }
}

impl<T> PagedResult<T> {
    pub fn new(data: Vec<T>, total: u64) -> Self {
        Self {
            data,
            total,
            messages: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::LifeError;

    #[test]
    fn test_paged_result_json() {
        let result = PagedResult::new(vec![1, 2], 12).with_message(Message::new("W01", "partial"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total"], 12);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["messages"][0]["itemName"], "");

        let back: PagedResult<i32> = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert_eq!(back, PagedResult::default());
    }

    #[test]
    fn test_message_from_error() {
        let err = LifeError::QueryError("boom".into()).in_operation("to_list");
        let message = Message::from_error("E500", "items", &err);
        assert_eq!(message.exception, "to_list: Query error: boom");
        assert_eq!(message.message, "Query error: boom");
    }
}
