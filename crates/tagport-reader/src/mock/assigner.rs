//! Mock tag assigner.

use crate::assignment::{AssignResponse, AssignTarget};
use crate::error::{ReaderError, Result};
use crate::traits::TagAssigner;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug)]
struct AssignerState {
    response: AssignResponse,
    failure: Option<String>,
    calls: Vec<(AssignTarget, String)>,
}

impl Default for AssignerState {
    fn default() -> Self {
        Self {
            response: AssignResponse {
                success: true,
                message: None,
            },
            failure: None,
            calls: Vec::new(),
        }
    }
}

/// Assigner with a scripted answer. Accepts every request by default.
#[derive(Debug, Clone, Default)]
pub struct MockTagAssigner {
    state: Arc<Mutex<AssignerState>>,
}

impl MockTagAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every following request with `response`.
    pub fn respond_with(&self, response: AssignResponse) {
        let mut state = self.lock();
        state.response = response;
        state.failure = None;
    }

    /// Fail every following request with an assignment error.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.lock().failure = Some(message.into());
    }

    /// Requests received so far, oldest first.
    pub fn calls(&self) -> Vec<(AssignTarget, String)> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AssignerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TagAssigner for MockTagAssigner {
    async fn assign(&self, target: AssignTarget, tag: &str) -> Result<AssignResponse> {
        let mut state = self.lock();
        state.calls.push((target, tag.to_string()));
        match &state.failure {
            Some(message) => Err(ReaderError::assignment(message.clone())),
            None => Ok(state.response.clone()),
        }
    }
}
