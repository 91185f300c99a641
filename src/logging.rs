//! File-based logging with daily rotation.
//!
//! The terminal belongs to the front end, so tracing output goes to rolling
//! files under the XDG data dir (`~/.local/share/dind-agent/logs/` by
//! default). `RUST_LOG` overrides the configured level when set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Application name used for the log directory and file names.
pub const APP_NAME: &str = "dind-agent";

/// Configuration for file logging.
///
/// # Example
///
/// ```rust
/// use dind_agent::logging::{LogLevel, LoggingConfig};
///
/// let config = LoggingConfig::new()
///     .with_log_dir("/var/log/dind-agent")
///     .with_level(LogLevel::Debug);
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether file logging is enabled.
    pub enabled: bool,
    /// Log files are named `{app_name}.log` with a date suffix.
    pub app_name: String,
    /// Custom log directory. If None, uses XDG data dir + "dind-agent/logs".
    pub log_dir: Option<PathBuf>,
    /// Log level filter.
    pub level: LogLevel,
}

impl LoggingConfig {
    /// Creates a new LoggingConfig with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a disabled logging configuration.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Sets a custom log directory.
    #[must_use]
    pub fn with_log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(path.into());
        self
    }

    /// Sets the log level filter.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_name: APP_NAME.to_string(),
            log_dir: None,
            level: LogLevel::default(),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level - most verbose.
    Trace,
    /// Debug level.
    Debug,
    /// Info level - default.
    #[default]
    Info,
    /// Warn level.
    Warn,
    /// Error level - least verbose.
    Error,
}

impl LogLevel {
    /// Returns the level as an `EnvFilter` directive.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to tracing_subscriber LevelFilter.
    #[must_use]
    pub fn to_filter(self) -> tracing_subscriber::filter::LevelFilter {
        match self {
            Self::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
            Self::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
            Self::Info => tracing_subscriber::filter::LevelFilter::INFO,
            Self::Warn => tracing_subscriber::filter::LevelFilter::WARN,
            Self::Error => tracing_subscriber::filter::LevelFilter::ERROR,
        }
    }
}

/// Guard that must be held to keep file logging active.
///
/// When dropped, flushes pending logs and stops file logging.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

impl fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingGuard").finish_non_exhaustive()
    }
}

static LOGGING_GUARD: std::sync::OnceLock<LoggingGuard> = std::sync::OnceLock::new();

/// Errors that can occur during logging initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingError {
    /// The specific error that occurred.
    pub kind: LoggingErrorKind,
}

/// Specific logging error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingErrorKind {
    /// Failed to determine XDG data directory.
    NoDataDir,
    /// Failed to create log directory.
    CreateDirFailed {
        /// The path that could not be created.
        path: PathBuf,
        /// The reason for failure.
        reason: String,
    },
    /// Subscriber initialization failed.
    SubscriberInitFailed {
        /// The reason for failure.
        reason: String,
    },
}

impl LoggingError {
    /// Creates a new LoggingError with the given kind.
    #[must_use]
    pub fn new(kind: LoggingErrorKind) -> Self {
        Self { kind }
    }

    /// Creates an error for missing XDG data directory.
    #[must_use]
    pub fn no_data_dir() -> Self {
        Self::new(LoggingErrorKind::NoDataDir)
    }

    /// Creates an error for failed directory creation.
    #[must_use]
    pub fn create_dir_failed(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::new(LoggingErrorKind::CreateDirFailed {
            path,
            reason: reason.into(),
        })
    }

    /// Creates an error for subscriber initialization failure.
    #[must_use]
    pub fn subscriber_init_failed(reason: impl Into<String>) -> Self {
        Self::new(LoggingErrorKind::SubscriberInitFailed {
            reason: reason.into(),
        })
    }

    /// Returns true if this is a missing data directory error.
    #[must_use]
    pub fn is_no_data_dir(&self) -> bool {
        matches!(self.kind, LoggingErrorKind::NoDataDir)
    }
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LoggingErrorKind::NoDataDir => write!(
                f,
                "could not determine XDG data directory; set XDG_DATA_HOME or use a custom log_dir"
            ),
            LoggingErrorKind::CreateDirFailed { path, reason } => write!(
                f,
                "failed to create log directory '{}': {}; check permissions",
                path.display(),
                reason
            ),
            LoggingErrorKind::SubscriberInitFailed { reason } => write!(
                f,
                "failed to initialize tracing subscriber: {}; a subscriber may already be set",
                reason
            ),
        }
    }
}

impl std::error::Error for LoggingError {}

/// Returns the directory logs are written to.
///
/// Also used for transcript dumps of failed sessions.
///
/// # Errors
///
/// Returns an error if no custom directory is set and the XDG data directory
/// cannot be determined.
pub fn log_dir(config: &LoggingConfig) -> Result<PathBuf, LoggingError> {
    if let Some(ref custom_dir) = config.log_dir {
        return Ok(custom_dir.clone());
    }

    dirs::data_local_dir()
        .map(|dir| dir.join(APP_NAME).join("logs"))
        .ok_or_else(LoggingError::no_data_dir)
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Initializes file logging with the given configuration.
///
/// Returns `Ok(None)` if logging is disabled. The returned guard must be held
/// for logs to keep flowing.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_file_logging(config: &LoggingConfig) -> Result<Option<LoggingGuard>, LoggingError> {
    if !config.enabled {
        return Ok(None);
    }

    let log_dir = log_dir(config)?;
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| LoggingError::create_dir_failed(log_dir.clone(), e.to_string()))?;

    let file_appender =
        tracing_appender::rolling::daily(&log_dir, format!("{}.log", config.app_name));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false),
        )
        .with(env_filter(config.level))
        .try_init()
        .map_err(|e| LoggingError::subscriber_init_failed(e.to_string()))?;

    Ok(Some(LoggingGuard { _guard: guard }))
}

/// Initializes file logging and keeps the guard for the process lifetime.
///
/// Returns `Ok(false)` if logging is disabled or was already initialized.
///
/// # Errors
///
/// See [`init_file_logging`].
pub fn init(config: &LoggingConfig) -> Result<bool, LoggingError> {
    if LOGGING_GUARD.get().is_some() {
        return Ok(false);
    }

    match init_file_logging(config)? {
        Some(guard) => {
            let _ = LOGGING_GUARD.set(guard);
            Ok(true)
        }
        None => Ok(false),
    }
}
