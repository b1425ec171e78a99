//! Error types for folio.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using folio's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for folio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input text had no recognizable title or author
    #[error("Structural parse error: {0}")]
    StructuralParse(String),

    /// Remote store refused a call transiently (rate limit, server error)
    #[error("Transient remote error: {message}")]
    TransientRemote {
        message: String,
        /// Server-suggested wait before the next attempt, when provided.
        retry_after: Option<Duration>,
    },

    /// Remote store refused a call permanently (validation, auth, schema)
    #[error("Permanent remote error: {0}")]
    PermanentRemote(String),

    /// A cover lookup source failed; the resolver falls through to the next
    #[error("Cover source error: {0}")]
    CoverSource(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a transient remote error without a retry-after hint.
    pub fn transient(message: impl Into<String>) -> Self {
        Error::TransientRemote {
            message: message.into(),
            retry_after: None,
        }
    }

    /// Build a transient remote error carrying the server's retry-after hint.
    pub fn transient_after(message: impl Into<String>, retry_after: Duration) -> Self {
        Error::TransientRemote {
            message: message.into(),
            retry_after: Some(retry_after),
        }
    }

    /// True for failures worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::TransientRemote { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_structural_parse() {
        let err = Error::StructuralParse("no title line".to_string());
        assert_eq!(err.to_string(), "Structural parse error: no title line");
    }

    #[test]
    fn test_error_display_transient_remote() {
        let err = Error::transient("rate limited");
        assert_eq!(err.to_string(), "Transient remote error: rate limited");
    }

    #[test]
    fn test_error_display_permanent_remote() {
        let err = Error::PermanentRemote("schema mismatch".to_string());
        assert_eq!(err.to_string(), "Permanent remote error: schema mismatch");
    }

    #[test]
    fn test_error_display_cover_source() {
        let err = Error::CoverSource("empty search result".to_string());
        assert_eq!(err.to_string(), "Cover source error: empty search result");
    }

    #[test]
    fn test_transient_after_carries_hint() {
        let err = Error::transient_after("rate limited", Duration::from_secs(2));
        match err {
            Error::TransientRemote { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(2)));
            }
            _ => panic!("Expected TransientRemote"),
        }
    }

    #[test]
    fn test_is_transient() {
        assert!(Error::transient("x").is_transient());
        assert!(!Error::PermanentRemote("x".to_string()).is_transient());
        assert!(!Error::CoverSource("x".to_string()).is_transient());
        assert!(!Error::StructuralParse("x".to_string()).is_transient());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
