use thiserror::Error;

use crate::{
    models::{Credentials, GeneratedCard},
    session::StoreError,
    transport::{ApiResponse, TransportError},
};

/// Local input problems. Nothing is sent when one of these is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Login without username or password.
    #[error("Enter username and password")]
    MissingCredentials,
    /// Registration with a blank field.
    #[error("Complete name, document and email")]
    MissingRegistrationFields,
    /// Card action with neither an explicit nor a remembered card.
    #[error("Enter a card id")]
    MissingCardId,
    /// Transaction action with a blank id.
    #[error("Enter a transaction id")]
    MissingTransactionId,
}

/// Why a client operation produced no response to show.
///
/// Non-2xx answers are not errors; they come back as [`ApiResponse`]s.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input was rejected before anything was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No HTTP status was obtained.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The session store failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Result of [`BankClient::login`](super::BankClient::login).
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Token stored, dashboard shown. `card_id` is the first card found.
    Authenticated {
        /// Who signed in.
        username: String,
        /// Active card after the refresh.
        card_id: Option<String>,
    },
    /// The service refused; the session was left untouched.
    Rejected(ApiResponse),
    /// A newer login, registration or logout started while this one was in
    /// flight, so its result was dropped.
    Superseded,
}

/// Result of [`BankClient::register`](super::BankClient::register).
///
/// Account creation and default-card creation are reported separately.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// Account and default card both created.
    Registered {
        /// The new account.
        username: String,
        /// Default card, when its number could be read.
        card: Option<GeneratedCard>,
    },
    /// The account exists and the session is authenticated, but the
    /// default card was not created. `response` is `None` when the card
    /// request never reached the service.
    CardCreationFailed {
        /// The new account.
        username: String,
        /// What the card endpoint answered.
        response: Option<ApiResponse>,
    },
    /// The service refused the registration.
    Rejected(ApiResponse),
    /// See [`LoginOutcome::Superseded`].
    Superseded,
}

/// What a new customer fills in.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationProfile {
    /// Holder name for the default card.
    pub full_name: String,
    /// Sign-in name.
    pub username: String,
    /// Initial password.
    pub password: String,
}

impl RegistrationProfile {
    /// Profile with an explicitly chosen username and password.
    pub fn new(
        full_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Demo onboarding: the email is the username and the identity document
    /// number is the initial password.
    pub fn from_document(
        full_name: impl Into<String>,
        document: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self::new(full_name, email, document)
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        let blank = |value: &str| value.trim().is_empty();
        if blank(&self.full_name) || blank(&self.username) || blank(&self.password) {
            return Err(ValidationError::MissingRegistrationFields);
        }
        Ok(())
    }

    pub(crate) fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

impl std::fmt::Debug for RegistrationProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationProfile")
            .field("full_name", &self.full_name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
