//! Process-wide handle to the active reader.
//!
//! Record-assignment workflows need "the tag in front of the reader" without
//! owning the reader. The component that owns a connection manager registers
//! it here on startup and unregisters it on teardown; it is the only writer.
//! Everyone else only reads.

use crate::traits::TagSource;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Single-slot registry of the active tag source.
#[derive(Debug)]
pub struct ReaderLocator<T> {
    current: RwLock<Option<Arc<T>>>,
}

impl<T> Default for ReaderLocator<T> {
    fn default() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }
}

impl<T: TagSource> ReaderLocator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `reader` the active source, replacing any previous one.
    pub fn register(&self, reader: Arc<T>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(reader);
        debug!("Reader registered with locator");
    }

    /// Clear the slot if `reader` is the registered source.
    ///
    /// A stale owner unregistering after a newer one registered leaves the
    /// newer registration in place. Returns whether the slot was cleared.
    pub fn unregister(&self, reader: &Arc<T>) -> bool {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some(registered) if Arc::ptr_eq(registered, reader) => {
                *current = None;
                debug!("Reader unregistered from locator");
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<Arc<T>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_registered(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Scan with the registered source. `None` when nothing is registered.
    pub async fn current_tag(&self) -> Option<String> {
        let reader = self.current()?;
        reader.current_tag().await
    }
}
