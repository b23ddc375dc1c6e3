//! Error types for reader-service calls.
//!
//! Every failure of a call to the reader service falls into one of three
//! kinds, see [`ErrorKind`]. Callers that surface failures to a user only
//! need the kind and the display message.

/// Result type alias for reader-service calls.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Coarse classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The call did not complete within its timeout.
    Timeout,
    /// The service could not be reached.
    Network,
    /// The service answered, but not with a usable success response.
    Service,
}

/// Errors that can occur while talking to a reader service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Call exceeded its timeout.
    #[error("{operation} timed out after {duration_ms}ms")]
    Timeout {
        operation: &'static str,
        duration_ms: u64,
    },

    /// Connection refused, reset, or otherwise failed below HTTP.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Non-success HTTP status.
    #[error("{operation} returned HTTP {status}")]
    Status { operation: &'static str, status: u16 },

    /// Body could not be decoded into the expected shape.
    #[error("Malformed response: {message}")]
    Malformed { message: String },

    /// The service reported `Success: false`. The message is the service's own.
    #[error("{message}")]
    Rejected { message: String },
}

impl ServiceError {
    pub fn timeout(operation: &'static str, duration_ms: u64) -> Self {
        Self::Timeout {
            operation,
            duration_ms,
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn status(operation: &'static str, status: u16) -> Self {
        Self::Status { operation, status }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Rejection carrying the service's message, or `fallback` when the
    /// service did not send one.
    pub fn rejected(message: Option<String>, fallback: &str) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Self::Rejected { message }
    }

    /// Kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Connection { .. } => ErrorKind::Network,
            Self::Status { .. } | Self::Malformed { .. } | Self::Rejected { .. } => {
                ErrorKind::Service
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ServiceError::timeout("read", 5000), ErrorKind::Timeout)]
    #[case(ServiceError::connection("refused"), ErrorKind::Network)]
    #[case(ServiceError::status("read", 500), ErrorKind::Service)]
    #[case(ServiceError::malformed("expected value"), ErrorKind::Service)]
    #[case(ServiceError::rejected(None, "Unknown error"), ErrorKind::Service)]
    fn test_kind(#[case] error: ServiceError, #[case] kind: ErrorKind) {
        assert_eq!(error.kind(), kind);
    }

    #[test]
    fn test_rejected_prefers_service_message() {
        let error = ServiceError::rejected(Some("Port busy".into()), "Unable to select device");
        assert_eq!(error.to_string(), "Port busy");
    }

    #[test]
    fn test_rejected_falls_back_on_missing_or_empty_message() {
        assert_eq!(
            ServiceError::rejected(None, "Test failed").to_string(),
            "Test failed"
        );
        assert_eq!(
            ServiceError::rejected(Some(String::new()), "Test failed").to_string(),
            "Test failed"
        );
    }

    #[test]
    fn test_timeout_display() {
        let error = ServiceError::timeout("GetDevices", 2000);
        assert_eq!(error.to_string(), "GetDevices timed out after 2000ms");
    }
}
