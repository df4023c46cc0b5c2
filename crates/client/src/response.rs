//! Response envelopes used by the backend.
//!
//! Successful responses wrap their payload as `{ "data": ... }`; list
//! endpoints may add a `total`. Error responses carry a `message`.

use serde::Deserialize;

/// Standard `{ "data": T }` envelope.
#[derive(Debug, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Error body. Older endpoints use `error` instead of `message`, and some
/// return a list of validation messages.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// First usable message, if any.
    pub fn into_message(self) -> Option<String> {
        let from_message = match self.message {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .find_map(|v| v.as_str().map(str::to_string)),
            _ => None,
        };
        from_message
            .or(self.error)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}
