//! Error types for the Cornerstone console.

use std::path::{Path, PathBuf};

/// Errors raised by record bookkeeping, storage, and upstream calls.
///
/// Each variant maps onto one HTTP-facing [`category`](Error::category).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A record with the given id does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind (collection name)
        kind: &'static str,
        /// Requested id
        id: String,
    },

    /// The operation collides with existing state.
    #[error("{kind} '{id}' {reason}")]
    Conflict {
        /// Record kind (collection name)
        kind: &'static str,
        /// Conflicting id
        id: String,
        /// What collided
        reason: String,
    },

    /// Record validation error
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// An app is switched off in the tenant settings.
    #[error("App '{app}' is disabled for this tenant")]
    AppDisabled {
        /// App identifier
        app: String,
    },

    /// An upstream service (Orbit, GitHub) failed.
    #[error("{service} error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Upstream {
        /// Upstream service name
        service: &'static str,
        /// HTTP status returned upstream, if any
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error on a known path
    #[error("I/O error at {}: {source}", .path.display())]
    IoPath {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience `Result` type alias used throughout the console.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a not-found error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a conflict error for a duplicate id.
    pub fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        Error::Conflict {
            kind,
            id: id.into(),
            reason: "already exists".to_string(),
        }
    }

    /// Creates a conflict error for a record still referenced elsewhere.
    pub fn in_use(kind: &'static str, id: impl Into<String>, by: impl AsRef<str>) -> Self {
        Error::Conflict {
            kind,
            id: id.into(),
            reason: format!("is still referenced by {}", by.as_ref()),
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates an upstream error.
    pub fn upstream(service: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Upstream {
            service,
            status,
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::IoPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Short machine-readable category used in API error bodies.
    pub fn category(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Conflict { .. } => "conflict",
            Error::Validation { .. } => "validation",
            Error::Config { .. } => "config",
            Error::AppDisabled { .. } => "app_disabled",
            Error::Upstream { .. } => "upstream",
            Error::Io(_) | Error::IoPath { .. } => "io",
            Error::Serialization(_) => "serialization",
        }
    }

    /// Returns whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Io(_) | Error::IoPath { .. } => true,
            Error::Upstream { status, .. } => match status {
                Some(code) => *code >= 500 || *code == 429,
                None => true,
            },
            Error::NotFound { .. }
            | Error::Conflict { .. }
            | Error::Validation { .. }
            | Error::Config { .. }
            | Error::AppDisabled { .. }
            | Error::Serialization(_) => false,
        }
    }

    /// The field a validation error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("credentials", "cred-1");
        assert_eq!(err.to_string(), "credentials not found: cred-1");
        assert_eq!(err.category(), "not_found");
    }

    #[test]
    fn test_conflict_display() {
        let err = Error::already_exists("vocab_types", "person");
        assert_eq!(err.to_string(), "vocab_types 'person' already exists");

        let err = Error::in_use("vocab_types", "person", "data type 'employee'");
        assert_eq!(
            err.to_string(),
            "vocab_types 'person' is still referenced by data type 'employee'"
        );
        assert_eq!(err.category(), "conflict");
    }

    #[test]
    fn test_validation_error_with_field() {
        let err = Error::validation_field("name", "must not be empty");
        assert_eq!(err.field(), Some("name"));
        let Error::Validation { field, message } = err else {
            unreachable!("Expected Validation error variant");
        };
        assert_eq!(field, Some("name".to_string()));
        assert_eq!(message, "must not be empty");
    }

    #[test]
    fn test_upstream_display() {
        let err = Error::upstream("orbit", Some(503), "service unavailable");
        assert_eq!(err.to_string(), "orbit error (HTTP 503): service unavailable");

        let err = Error::upstream("github", None, "connection refused");
        assert_eq!(err.to_string(), "github error: connection refused");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::upstream("orbit", Some(502), "bad gateway").is_retryable());
        assert!(Error::upstream("orbit", Some(429), "slow down").is_retryable());
        assert!(Error::upstream("orbit", None, "timeout").is_retryable());
        assert!(!Error::upstream("orbit", Some(400), "bad request").is_retryable());
        assert!(!Error::validation("bad").is_retryable());
        assert!(!Error::not_found("vcts", "x").is_retryable());
        assert!(Error::Io(std::io::Error::other("disk")).is_retryable());
    }

    #[test]
    fn test_io_with_path() {
        let err = Error::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            "/data/credentials.json",
        );
        assert!(err.to_string().contains("/data/credentials.json"));
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_serde_error_not_retryable() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: Error = serde_err.into();
        assert_eq!(err.category(), "serialization");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_app_disabled() {
        let err = Error::AppDisabled {
            app: "vct-builder".to_string(),
        };
        assert_eq!(err.category(), "app_disabled");
        assert!(err.to_string().contains("vct-builder"));
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
