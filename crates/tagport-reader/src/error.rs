//! Error types for the reader subsystem.
//!
//! Most public operations of the connection manager never return these: they
//! resolve to an outcome and emit a notification instead. `ReaderError` is
//! what the collaborator traits (registry, device store, navigator, tag
//! assigner) report back to the manager.

use tagport_network::ServiceError;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors that can occur in the reader subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The device registry could not be queried.
    #[error("Registry error: {message}")]
    Registry { message: String },

    /// The local device store failed.
    #[error("Device store error: {message}")]
    Store { message: String },

    /// The configuration form could not be opened.
    #[error("Navigation error: {message}")]
    Navigation { message: String },

    /// The backend could not process a tag assignment.
    #[error("Assignment error: {message}")]
    Assignment { message: String },

    /// Reader service call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Persisted record or configuration was invalid.
    #[error(transparent)]
    Core(#[from] tagport_core::Error),
}

impl ReaderError {
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation {
            message: message.into(),
        }
    }

    pub fn assignment(message: impl Into<String>) -> Self {
        Self::Assignment {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error() {
        let error = ReaderError::registry("database is locked");
        assert!(matches!(error, ReaderError::Registry { .. }));
        assert_eq!(error.to_string(), "Registry error: database is locked");
    }

    #[test]
    fn test_service_error_is_transparent() {
        let error: ReaderError = ServiceError::connection("refused").into();
        assert_eq!(error.to_string(), "Connection error: refused");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let error: ReaderError = tagport_core::Error::InvalidRecord("empty".into()).into();
        assert_eq!(error.to_string(), "Invalid persisted device record: empty");
    }
}
