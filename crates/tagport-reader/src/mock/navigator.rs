//! Navigator that records the forms it was asked to open.

use crate::error::{ReaderError, Result};
use crate::traits::{ConfigForm, RecordNavigator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    opened: Mutex<Vec<ConfigForm>>,
    failing: AtomicBool,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<ConfigForm> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl RecordNavigator for RecordingNavigator {
    fn open_config_form(&self, form: ConfigForm) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReaderError::navigation("form view unavailable"));
        }
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(form);
        Ok(())
    }
}
