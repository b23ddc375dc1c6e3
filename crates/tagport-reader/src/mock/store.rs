//! In-memory device store.

use crate::error::{ReaderError, Result};
use crate::traits::DeviceStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct StoreState {
    values: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

/// Key/value store that lives as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryDeviceStore {
    state: Arc<StoreState>,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.state
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current raw value of `key`, bypassing failure injection.
    pub fn value(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    /// Write a raw value, bypassing failure injection.
    pub fn insert(&self, key: &str, value: &str) {
        self.values().insert(key.to_string(), value.to_string());
    }

    /// Make every trait call fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(ReaderError::store("store unavailable"));
        }
        Ok(())
    }
}

impl DeviceStore for MemoryDeviceStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.values().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryDeviceStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryDeviceStore::new();
        store.insert("k", "v");
        store.set_failing(true);

        assert!(store.get("k").await.is_err());
        assert_eq!(store.value("k").as_deref(), Some("v"));
    }
}
