//! Persisted session state: who is signed in, with which token, and which
//! card is currently remembered.
//!
//! Access goes through [`SessionStore`] so the client never reaches for
//! ambient storage. [`MemoryStore`] backs tests; [`FileStore`] backs the CLI.

mod file;
mod memory;

use std::fmt;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Typed keys of the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionKey {
    /// Signed-in user.
    Username,
    /// Bearer token.
    Token,
    /// Active card reference.
    CardId,
}

impl SessionKey {
    /// All keys, in storage order.
    pub const ALL: [Self; 3] = [Self::Username, Self::Token, Self::CardId];

    /// Name under which the value is persisted.
    #[must_use]
    pub const fn storage_name(self) -> &'static str {
        match self {
            Self::Username => "bankinc_user",
            Self::Token => "bankinc_token",
            Self::CardId => "bankinc_card",
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_name())
    }
}

/// Failures of a session backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("session store I/O failed at {path}: {source}")]
    Io {
        /// Backing file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not a session document.
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        /// Backing file.
        path: String,
        /// Why the contents did not parse.
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value storage for the session.
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// Reads a value; absent keys are `Ok(None)`.
    ///
    /// # Errors
    /// Backend failures only.
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    /// Backend failures only.
    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError>;

    /// Deletes a value. Removing an absent key is fine.
    ///
    /// # Errors
    /// Backend failures only.
    fn remove(&self, key: SessionKey) -> Result<(), StoreError>;

    /// Deletes every session value.
    ///
    /// # Errors
    /// Backend failures only.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Everything the store knows, read in one go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Signed-in user.
    pub username: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
    /// Active card reference.
    pub card_id: Option<String>,
}

impl SessionSnapshot {
    /// Reads all keys from `store`.
    ///
    /// # Errors
    /// Propagates the first backend failure.
    pub fn load(store: &dyn SessionStore) -> Result<Self, StoreError> {
        Ok(Self {
            username: store.get(SessionKey::Username)?,
            token: store.get(SessionKey::Token)?,
            card_id: store.get(SessionKey::CardId)?,
        })
    }

    /// A session counts only when both the user and the token are known.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        present(&self.username) && present(&self.token)
    }
}

/// The two mutually exclusive screens of the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    /// Login and registration forms.
    #[default]
    SignedOut,
    /// Card and transaction actions.
    Dashboard,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SignedOut => "signed out",
            Self::Dashboard => "dashboard",
        })
    }
}
