//! Top-level error type.
//!
//! Tool failures never surface here: they become tool results the model can
//! read. `DindError` covers what stops the program before or around a
//! session: configuration, the completion endpoint, logging setup and I/O.
//!
//! No external error crates (anyhow, thiserror, eyre) are used in the library.

use crate::llm::LLMError;
use crate::logging::LoggingError;
use std::fmt;
use std::path::PathBuf;

/// Errors raised outside a session's tool loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DindError {
    /// The specific error that occurred
    pub kind: DindErrorKind,
}

/// Specific error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DindErrorKind {
    /// Missing or invalid configuration; fatal at startup
    Configuration {
        /// The offending field or source
        field: String,
        /// Why it is invalid
        reason: String,
    },
    /// The completion endpoint could not be set up or reached
    Endpoint(LLMError),
    /// Logging could not be initialized
    Logging(LoggingError),
    /// A filesystem operation outside the tool loop failed
    Io {
        /// The path involved
        path: PathBuf,
        /// The underlying error message
        reason: String,
    },
}

impl DindError {
    /// Creates a new DindError with the given kind.
    #[must_use]
    pub fn new(kind: DindErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(DindErrorKind::Configuration {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Creates an error for a required environment variable that is unset.
    #[must_use]
    pub fn missing_env(var: &str) -> Self {
        Self::configuration(
            var,
            format!("environment variable {var} is not set; export it before starting"),
        )
    }

    /// Creates an I/O error for the given path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::new(DindErrorKind::Io {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// Returns true if this error indicates a configuration problem.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, DindErrorKind::Configuration { .. })
    }

    /// Returns true if this error came from the completion endpoint.
    #[must_use]
    pub fn is_endpoint(&self) -> bool {
        matches!(self.kind, DindErrorKind::Endpoint(_))
    }
}

impl fmt::Display for DindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DindErrorKind::Configuration { field, reason } => {
                write!(f, "configuration error for '{}': {}", field, reason)
            }
            DindErrorKind::Endpoint(error) => write!(f, "completion endpoint error: {}", error),
            DindErrorKind::Logging(error) => write!(f, "logging setup failed: {}", error),
            DindErrorKind::Io { path, reason } => {
                write!(f, "I/O error on '{}': {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for DindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            DindErrorKind::Endpoint(error) => Some(error),
            DindErrorKind::Logging(error) => Some(error),
            _ => None,
        }
    }
}

impl From<LLMError> for DindError {
    fn from(error: LLMError) -> Self {
        Self::new(DindErrorKind::Endpoint(error))
    }
}

impl From<LoggingError> for DindError {
    fn from(error: LoggingError) -> Self {
        Self::new(DindErrorKind::Logging(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn configuration_display_names_field() {
        let error = DindError::configuration("max_turns", "must be at least 1");
        let message = error.to_string();
        assert!(message.contains("max_turns"));
        assert!(message.contains("must be at least 1"));
        assert!(error.is_configuration());
    }

    #[test]
    fn missing_env_is_configuration() {
        let error = DindError::missing_env("OPENAI_API_KEY");
        assert!(error.is_configuration());
        assert!(error.to_string().contains("OPENAI_API_KEY is not set"));
    }

    #[test]
    fn endpoint_error_keeps_source() {
        let error = DindError::from(LLMError::unauthorized("bad key"));
        assert!(error.is_endpoint());
        assert!(error.source().is_some());
    }

    #[test]
    fn io_display_includes_path() {
        let error = DindError::io("/tmp/x.json", "disk full");
        assert_eq!(error.to_string(), "I/O error on '/tmp/x.json': disk full");
    }
}
