//! Observable connection session state.
//!
//! The session lives in a `tokio::sync::watch` channel owned by the
//! connection manager. Readers take snapshots or subscribe to changes; only
//! the manager writes.

use tagport_core::{ConnectionStatus, ReaderInfo};
use tokio::sync::watch;
use tracing::debug;

/// The single active connection of a client.
///
/// `reader_info` is present exactly when `status` is `Connected`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSession {
    reader_info: Option<ReaderInfo>,
    status: ConnectionStatus,
    is_scanning: bool,
    /// Bumped by every `begin_connecting` and `reset`. An attempt may only
    /// finish while the id it started with is still current.
    attempt: u64,
}

impl ConnectionSession {
    #[must_use]
    pub fn reader_info(&self) -> Option<&ReaderInfo> {
        self.reader_info.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.reader_info.is_some()
    }

    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.is_scanning
    }

    /// Reader of the active connection, if connected.
    #[must_use]
    pub fn connected_reader(&self) -> Option<&ReaderInfo> {
        if self.is_connected() {
            self.reader_info.as_ref()
        } else {
            None
        }
    }

    /// Enter `Connecting` and return the id of the new attempt. Returns
    /// `None`, leaving the session untouched, unless the session is
    /// currently disconnected.
    pub(crate) fn begin_connecting(&mut self) -> Option<u64> {
        if !self.status.can_transition_to(ConnectionStatus::Connecting) {
            return None;
        }
        self.attempt = self.attempt.wrapping_add(1);
        self.status = ConnectionStatus::Connecting;
        debug!(status = %self.status, attempt = self.attempt, "Session transition");
        Some(self.attempt)
    }

    fn owns(&self, attempt: u64) -> bool {
        self.status == ConnectionStatus::Connecting && self.attempt == attempt
    }

    /// Complete connection attempt `attempt`. Returns false if that attempt
    /// was abandoned, even when a newer attempt is now connecting.
    pub(crate) fn complete(&mut self, attempt: u64, info: ReaderInfo) -> bool {
        if !self.owns(attempt) {
            return false;
        }
        self.reader_info = Some(info);
        self.status = ConnectionStatus::Connected;
        debug!(status = %self.status, attempt, "Session transition");
        true
    }

    /// Give up attempt `attempt`. Returns false if it was already abandoned.
    pub(crate) fn abandon(&mut self, attempt: u64) -> bool {
        if !self.owns(attempt) {
            return false;
        }
        self.reset();
        true
    }

    /// Back to the initial state. Returns the reader that was connected.
    pub(crate) fn reset(&mut self) -> Option<ReaderInfo> {
        self.attempt = self.attempt.wrapping_add(1);
        self.status = ConnectionStatus::Disconnected;
        self.is_scanning = false;
        self.reader_info.take()
    }

    pub(crate) fn set_scanning(&mut self, scanning: bool) {
        self.is_scanning = scanning;
    }
}

/// Manager activity that is not part of the connection itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityState {
    /// A discovery pass is running.
    pub is_discovering: bool,
    /// Reader id of the device under `test_device`, if any.
    pub testing_device: Option<String>,
}

/// Applies `reset` to a watched value when dropped.
///
/// Keeps transient flags (scanning, discovering, testing) from sticking when
/// the future that set them is cancelled.
pub(crate) struct ResetOnDrop<'a, T> {
    sender: &'a watch::Sender<T>,
    reset: fn(&mut T),
}

impl<'a, T> ResetOnDrop<'a, T> {
    /// Apply `set` now and `reset` on drop.
    pub(crate) fn new(
        sender: &'a watch::Sender<T>,
        set: impl FnOnce(&mut T),
        reset: fn(&mut T),
    ) -> Self {
        sender.send_modify(set);
        Self { sender, reset }
    }
}

impl<T> Drop for ResetOnDrop<'_, T> {
    fn drop(&mut self) {
        self.sender.send_modify(self.reset);
    }
}
