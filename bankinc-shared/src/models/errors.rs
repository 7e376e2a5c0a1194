use serde::{Deserialize, Serialize};

use crate::transport::ResponseBody;

/// Error body produced by the service's exception handler.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human readable reason, e.g. "Saldo insuficiente".
    pub message: String,
}

impl ErrorResponse {
    /// Reads the message out of a response body when it has the expected shape.
    #[must_use]
    pub fn from_body(body: &ResponseBody) -> Option<Self> {
        match body {
            ResponseBody::Json(value) => serde_json::from_value(value.clone()).ok(),
            ResponseBody::Text(_) => None,
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorResponse {}
