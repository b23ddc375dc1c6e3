//! Tag scan classification.
//!
//! A read returns every tag in the reader's field. Exactly one tag is a
//! result; zero is "no tag"; two or more is a conflict and nothing is
//! returned, since an ambiguous read is never partially accepted.

use crate::messages::NoticeMessages;
use tagport_core::Notification;
use tagport_network::wire::TagRecord;
use tagport_network::{ErrorKind, ServiceError};

/// Outcome of one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Exactly one tag was in the field.
    Tag(String),
    NoTag,
    /// Two or more tags were in the field.
    Conflict { count: usize },
    /// No reader is connected.
    NotConnected,
    Failed(ServiceError),
}

impl ScanOutcome {
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Tag(uid) => Some(uid),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_tag(self) -> Option<String> {
        match self {
            Self::Tag(uid) => Some(uid),
            _ => None,
        }
    }

    /// What to tell the user. A successful read is silent.
    #[must_use]
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Self::Tag(_) => None,
            Self::NoTag => Some(Notification::info(NoticeMessages::NO_TAG)),
            Self::Conflict { .. } => Some(Notification::warning(NoticeMessages::MULTIPLE_TAGS)),
            Self::NotConnected => Some(Notification::warning(NoticeMessages::NOT_CONNECTED)),
            Self::Failed(error) => Some(scan_error_notification(error)),
        }
    }
}

/// Classify the tags returned by a successful read.
#[must_use]
pub fn classify_tags(tags: Vec<TagRecord>) -> ScanOutcome {
    let count = tags.len();
    match tags.into_iter().next() {
        None => ScanOutcome::NoTag,
        Some(tag) if count == 1 => ScanOutcome::Tag(tag.uid),
        Some(_) => ScanOutcome::Conflict { count },
    }
}

/// Timeouts are a warning; everything else is a danger.
#[must_use]
pub fn scan_error_notification(error: &ServiceError) -> Notification {
    match error.kind() {
        ErrorKind::Timeout => Notification::warning(NoticeMessages::SCAN_TIMEOUT),
        ErrorKind::Network => Notification::danger(NoticeMessages::SCAN_NETWORK_ERROR),
        ErrorKind::Service => Notification::danger(NoticeMessages::scan_error(error)),
    }
}
