//! Scan-and-assign workflow.
//!
//! Binds the tag currently in front of the active reader to a partner or a
//! vehicle record. The reader is found through the [`ReaderLocator`]; the
//! backend decides whether the binding is allowed.

use crate::locator::ReaderLocator;
use crate::messages::NoticeMessages;
use crate::traits::{NotificationSink, TagAssigner, TagSource};
use std::fmt;
use tagport_core::Notification;
use tracing::{info, warn};

/// Record a tag can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignTarget {
    Partner(i64),
    Vehicle(i64),
}

impl AssignTarget {
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::Partner(id) | Self::Vehicle(id) => *id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Partner(_) => "partner",
            Self::Vehicle(_) => "vehicle",
        }
    }
}

impl fmt::Display for AssignTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// Backend answer to an assignment request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl AssignResponse {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Result of [`scan_and_assign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    /// No reader is registered with the locator.
    ReaderUnavailable,
    /// The scan produced no single tag. The scan already notified the user.
    NoTag,
    Assigned { tag: String, message: String },
    Rejected { tag: String, message: String },
    Failed { tag: String, error: String },
}

impl AssignOutcome {
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }
}

/// Scan once and assign the tag to `target`.
///
/// Exactly one notification is emitted for every outcome except `NoTag`,
/// where the scan has already reported why no tag was returned.
pub async fn scan_and_assign<T, A>(
    locator: &ReaderLocator<T>,
    assigner: &A,
    notifier: &dyn NotificationSink,
    target: AssignTarget,
) -> AssignOutcome
where
    T: TagSource,
    A: TagAssigner,
{
    let Some(reader) = locator.current() else {
        notifier.notify(Notification::warning(NoticeMessages::READER_NOT_INITIALIZED));
        return AssignOutcome::ReaderUnavailable;
    };

    let Some(tag) = reader.current_tag().await else {
        return AssignOutcome::NoTag;
    };

    match assigner.assign(target, &tag).await {
        Ok(response) if response.success => {
            let message = response
                .message
                .unwrap_or_else(|| NoticeMessages::ASSIGNED.to_string());
            info!(%target, tag = %tag, "Tag assigned");
            notifier.notify(Notification::success(message.clone()));
            AssignOutcome::Assigned { tag, message }
        }
        Ok(response) => {
            let message = response
                .message
                .unwrap_or_else(|| NoticeMessages::ASSIGN_REJECTED.to_string());
            warn!(%target, tag = %tag, reason = %message, "Tag assignment rejected");
            notifier.notify(Notification::warning(message.clone()));
            AssignOutcome::Rejected { tag, message }
        }
        Err(e) => {
            warn!(%target, tag = %tag, error = %e, "Tag assignment failed");
            notifier.notify(Notification::danger(NoticeMessages::assign_error(&e)));
            AssignOutcome::Failed {
                tag,
                error: e.to_string(),
            }
        }
    }
}
