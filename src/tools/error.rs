//! Tool error types.
//!
//! Every failure a tool call can hit: an unknown tool name, arguments that
//! do not match the schema, a timeout, or a filesystem/process error. None of
//! these abort a session. The registry turns them into error `ToolResult`s so
//! the model sees them on its next turn.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur while resolving or executing a tool call.
///
/// This type uses `Box<ToolErrorKind>` to keep the error size small,
/// enabling efficient use in Result types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    /// The specific error that occurred (boxed for size efficiency)
    kind: Box<ToolErrorKind>,
}

/// Specific tool error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// No tool with this name is registered
    UnknownTool {
        /// The name the model asked for
        name: String,
        /// Closest registered name, if any is reasonably similar
        suggestion: Option<String>,
    },
    /// Arguments did not satisfy the tool's schema
    InvalidArguments {
        /// The name of the tool
        tool_name: String,
        /// What was invalid
        reason: String,
    },
    /// The operation exceeded its wall-clock budget
    Timeout {
        /// The timeout that was exceeded
        duration: Duration,
    },
    /// A path did not exist
    NotFound {
        /// The path as resolved by the shim
        path: PathBuf,
    },
    /// The OS refused access to a path
    PermissionDenied {
        /// The path as resolved by the shim
        path: PathBuf,
    },
    /// Any other I/O failure
    Io {
        /// Description of the failure
        reason: String,
    },
    /// The tool ran but could not complete (spawn failure, provider error, ...)
    ExecutionFailed {
        /// The name of the tool
        tool_name: String,
        /// Reason for failure
        reason: String,
    },
}

/// Flat, serializable classification of a [`ToolError`].
///
/// Stored in the transcript alongside the error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorCode {
    /// See [`ToolErrorKind::UnknownTool`]
    UnknownTool,
    /// See [`ToolErrorKind::InvalidArguments`]
    InvalidArguments,
    /// See [`ToolErrorKind::Timeout`]
    Timeout,
    /// See [`ToolErrorKind::NotFound`]
    NotFound,
    /// See [`ToolErrorKind::PermissionDenied`]
    PermissionDenied,
    /// See [`ToolErrorKind::Io`]
    Io,
    /// See [`ToolErrorKind::ExecutionFailed`]
    ExecutionFailed,
}

impl fmt::Display for ToolErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UnknownTool => "unknown_tool",
            Self::InvalidArguments => "invalid_arguments",
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::Io => "io_error",
            Self::ExecutionFailed => "execution_failed",
        };
        f.write_str(label)
    }
}

impl ToolError {
    /// Creates a new ToolError with the given kind.
    #[must_use]
    pub fn new(kind: ToolErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    /// Returns a reference to the error kind.
    #[must_use]
    pub fn kind(&self) -> &ToolErrorKind {
        &self.kind
    }

    /// Creates an unknown tool error.
    #[must_use]
    pub fn unknown_tool(name: impl Into<String>, suggestion: Option<String>) -> Self {
        Self::new(ToolErrorKind::UnknownTool {
            name: name.into(),
            suggestion,
        })
    }

    /// Creates an invalid arguments error.
    #[must_use]
    pub fn invalid_arguments(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(duration: Duration) -> Self {
        Self::new(ToolErrorKind::Timeout { duration })
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(ToolErrorKind::NotFound { path: path.into() })
    }

    /// Creates a permission denied error.
    #[must_use]
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::new(ToolErrorKind::PermissionDenied { path: path.into() })
    }

    /// Creates a generic I/O error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Io {
            reason: reason.into(),
        })
    }

    /// Creates an execution failed error.
    #[must_use]
    pub fn execution_failed(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Maps a `std::io::Error` raised while touching `path`.
    ///
    /// `NotFound` and `PermissionDenied` keep their own kinds; everything
    /// else becomes [`ToolErrorKind::Io`].
    #[must_use]
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::io(format!("{}: {error}", path.display())),
        }
    }

    /// Returns the flat classification of this error.
    #[must_use]
    pub fn code(&self) -> ToolErrorCode {
        match *self.kind {
            ToolErrorKind::UnknownTool { .. } => ToolErrorCode::UnknownTool,
            ToolErrorKind::InvalidArguments { .. } => ToolErrorCode::InvalidArguments,
            ToolErrorKind::Timeout { .. } => ToolErrorCode::Timeout,
            ToolErrorKind::NotFound { .. } => ToolErrorCode::NotFound,
            ToolErrorKind::PermissionDenied { .. } => ToolErrorCode::PermissionDenied,
            ToolErrorKind::Io { .. } => ToolErrorCode::Io,
            ToolErrorKind::ExecutionFailed { .. } => ToolErrorCode::ExecutionFailed,
        }
    }

    /// Returns true if this error indicates the tool was not registered.
    #[must_use]
    pub fn is_unknown_tool(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::UnknownTool { .. })
    }

    /// Returns true if this error indicates a schema violation.
    #[must_use]
    pub fn is_invalid_arguments(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::InvalidArguments { .. })
    }

    /// Returns true if this error is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::Timeout { .. })
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_ref() {
            ToolErrorKind::UnknownTool { name, suggestion } => {
                write!(f, "unknown tool '{name}'")?;
                match suggestion {
                    Some(candidate) => write!(f, "; did you mean '{candidate}'?"),
                    None => write!(f, "; use one of the tools listed in the system prompt"),
                }
            }
            ToolErrorKind::InvalidArguments { tool_name, reason } => {
                write!(
                    f,
                    "invalid arguments for tool '{tool_name}': {reason}; check the argument schema"
                )
            }
            ToolErrorKind::Timeout { duration } => {
                write!(
                    f,
                    "timed out after {} seconds; the process group was killed",
                    duration.as_secs()
                )
            }
            ToolErrorKind::NotFound { path } => {
                write!(f, "no such file or directory: {}", path.display())
            }
            ToolErrorKind::PermissionDenied { path } => {
                write!(f, "permission denied: {}", path.display())
            }
            ToolErrorKind::Io { reason } => write!(f, "I/O error: {reason}"),
            ToolErrorKind::ExecutionFailed { tool_name, reason } => {
                write!(f, "tool '{tool_name}' execution failed: {reason}")
            }
        }
    }
}

impl std::error::Error for ToolError {}
