//! Session persistence error types

use std::fmt;

/// Errors that can occur while persisting session records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Required configuration (database or collection name) is missing.
    /// Raised once at construction, before any backend contact.
    Configuration(String),
    /// The backend could not be reached or the collection could not be
    /// selected at `open()`
    Connectivity(String),
    /// A find/insert/upsert/delete was rejected by the backend.
    /// Always carries the backend's last-error detail, and the offending
    /// session id where one applies.
    Persistence {
        message: String,
        sid: Option<String>,
    },
}

impl SessionError {
    /// Build a persistence error tied to a session id
    pub(crate) fn persistence<S: Into<String>>(message: S, sid: &str) -> Self {
        SessionError::Persistence {
            message: message.into(),
            sid: Some(sid.to_string()),
        }
    }

    /// Build a persistence error with no associated session id (bulk ops)
    pub(crate) fn persistence_bulk<S: Into<String>>(message: S) -> Self {
        SessionError::Persistence {
            message: message.into(),
            sid: None,
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            SessionError::Connectivity(msg) => write!(f, "Connectivity error: {}", msg),
            SessionError::Persistence { message, sid } => match sid {
                Some(sid) => write!(f, "Persistence error for session '{}': {}", sid, message),
                None => write!(f, "Persistence error: {}", message),
            },
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_backend_detail() {
        let err = SessionError::persistence("E11000 duplicate key", "abc123");
        let text = err.to_string();
        assert!(text.contains("abc123"));
        assert!(text.contains("E11000 duplicate key"));

        let err = SessionError::persistence_bulk("delete rejected");
        assert_eq!(err.to_string(), "Persistence error: delete rejected");
    }
}
