use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transport::{ApiResponse, ResponseBody};

/// Body of `/auth/login` and `/auth/register`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Plain-text password, only ever sent over the wire.
    pub password: String,
}

impl Credentials {
    /// Builds credentials from borrowed parts.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful authentication payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    /// Opaque bearer token.
    pub token: String,
}

impl AuthResponse {
    /// Extracts the token from a login or registration response.
    ///
    /// Only a `200` whose JSON body carries a non-empty `token` counts.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Option<Self> {
        if response.status != 200 {
            return None;
        }
        let ResponseBody::Json(value) = &response.body else {
            return None;
        };
        serde_json::from_value::<Self>(value.clone())
            .ok()
            .filter(|auth| !auth.token.is_empty())
    }
}
