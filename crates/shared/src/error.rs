use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error or timeout. Please check your connection.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";
/// Status reported when no HTTP response was received at all.
pub const NETWORK_STATUS_CODE: u16 = 0;

/// Body fields consulted, in order, for a human-readable failure message.
const MESSAGE_FIELDS: [&str; 3] = ["error", "detail", "message"];

/// Single error type for every failed backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status_code: u16, details: Option<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            details,
        }
    }

    /// Transport failure with no response: timeout, DNS, refused connection.
    pub fn network() -> Self {
        Self::new(NETWORK_ERROR_MESSAGE, NETWORK_STATUS_CODE, None)
    }

    /// Converts a non-success response into an error, pulling the message out of
    /// the body when the body is a JSON object.
    pub fn from_response(status_code: u16, body: &str) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
            return Self::new(UNEXPECTED_ERROR_MESSAGE, status_code, None);
        };

        let message = MESSAGE_FIELDS
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .unwrap_or(UNEXPECTED_ERROR_MESSAGE)
            .to_string();
        let details = serde_json::to_string(&Value::Object(fields)).ok();

        Self::new(message, status_code, details)
    }

    /// A success status whose body could not be decoded into the expected shape.
    pub fn malformed(status_code: u16, details: impl Into<String>) -> Self {
        Self::new(UNEXPECTED_ERROR_MESSAGE, status_code, Some(details.into()))
    }

    pub fn is_network(&self) -> bool {
        self.status_code == NETWORK_STATUS_CODE
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
