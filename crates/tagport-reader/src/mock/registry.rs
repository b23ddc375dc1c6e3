//! Mock reader registry.

use crate::error::{ReaderError, Result};
use crate::traits::ReaderRegistry;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct RegistryState {
    /// (record id, reader id)
    records: Mutex<Vec<(i64, String)>>,
    failing: AtomicBool,
    count_calls: AtomicUsize,
}

/// Registry backed by a list of records.
///
/// # Examples
///
/// ```
/// use tagport_reader::mock::MockRegistry;
/// use tagport_reader::traits::ReaderRegistry;
///
/// # #[tokio::main]
/// # async fn main() {
/// let registry = MockRegistry::with_readers(&["R-01"]);
/// assert_eq!(registry.count_by_reader_id("R-01").await.unwrap(), 1);
///
/// registry.remove_reader("R-01");
/// assert_eq!(registry.count_by_reader_id("R-01").await.unwrap(), 0);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    state: Arc<RegistryState>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One record per reader id, numbered from 1.
    pub fn with_readers(reader_ids: &[&str]) -> Self {
        let registry = Self::new();
        for reader_id in reader_ids {
            registry.add_reader(reader_id);
        }
        registry
    }

    /// Add a record and return its id.
    pub fn add_reader(&self, reader_id: &str) -> i64 {
        let mut records = self
            .state
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = records.len() as i64 + 1;
        records.push((id, reader_id.to_string()));
        id
    }

    pub fn remove_reader(&self, reader_id: &str) {
        self.state
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(_, r)| r != reader_id);
    }

    /// Make every query fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    pub fn count_calls(&self) -> usize {
        self.state.count_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(ReaderError::registry("registry unavailable"));
        }
        Ok(())
    }

    fn ids(&self, reader_id: &str) -> Vec<i64> {
        self.state
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, r)| r == reader_id)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl ReaderRegistry for MockRegistry {
    async fn count_by_reader_id(&self, reader_id: &str) -> Result<u64> {
        self.state.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.ids(reader_id).len() as u64)
    }

    async fn find_ids_by_reader_id(&self, reader_id: &str) -> Result<Vec<i64>> {
        self.check()?;
        Ok(self.ids(reader_id))
    }
}
