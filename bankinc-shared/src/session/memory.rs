use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::{SessionKey, SessionStore, StoreError};

/// In-process session storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<SessionKey, String>>,
}

impl MemoryStore {
    fn values(&self) -> MutexGuard<'_, HashMap<SessionKey, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError> {
        Ok(self.values().get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        self.values().insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), StoreError> {
        self.values().remove(&key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.values().clear();
        Ok(())
    }
}
