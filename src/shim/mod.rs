//! Execution shim.
//!
//! The thin layer between the tools and the operating system: shell commands
//! run in their own process group with a timeout and capped output, and file
//! operations map OS errors onto [`ToolError`](crate::tools::ToolError) kinds.
//!
//! ## Isolation
//!
//! The shim does **not** confine anything. Relative paths and working
//! directories resolve against the workspace root, but absolute paths and
//! `..` traversal pass through unmodified, and commands run with the full
//! privileges of the process. The workspace root is an instruction to the
//! model, not a boundary. Run this only inside a disposable container on an
//! isolated host.

mod fs;
mod process;

pub use fs::{DirEntry, EntryKind, WriteMode, WriteReport};
pub use process::ShellOutput;
pub(crate) use process::render_capped;

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default cap on captured bytes per output stream (64 KiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// Settings for an [`ExecutionShim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimConfig {
    /// Directory that relative paths and working directories resolve against
    pub root: PathBuf,
    /// Shell program invoked as `<shell> -c <command>`
    pub shell: String,
    /// Timeout applied when a call does not ask for one
    pub default_timeout: Duration,
    /// Upper bound on any requested timeout
    pub max_timeout: Duration,
    /// Cap on captured bytes per stream and per file read
    pub max_output_bytes: usize,
}

impl ShimConfig {
    /// Creates a config rooted at `root` with default limits.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Sets the shell program.
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Sets the default and maximum timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, default_timeout: Duration, max_timeout: Duration) -> Self {
        self.default_timeout = default_timeout;
        self.max_timeout = max_timeout.max(default_timeout);
        self
    }

    /// Sets the output cap.
    #[must_use]
    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/workdir"),
            shell: "bash".to_string(),
            default_timeout: Duration::from_secs(120),
            max_timeout: Duration::from_secs(600),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// Runs commands and touches files on behalf of the tools.
///
/// Holds only immutable configuration; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ExecutionShim {
    config: ShimConfig,
}

impl ExecutionShim {
    /// Creates a shim with the given configuration.
    #[must_use]
    pub fn new(config: ShimConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    /// Returns the workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Resolves `path` against the workspace root.
    ///
    /// Absolute paths are returned as given; relative paths are joined onto
    /// the root without normalizing `..`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.config.root.join(candidate)
        }
    }

    /// Clamps a requested timeout to the configured maximum.
    #[must_use]
    pub fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        requested
            .unwrap_or(self.config.default_timeout)
            .min(self.config.max_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_relative_joins_root() {
        let shim = ExecutionShim::new(ShimConfig::new("/workdir"));
        assert_eq!(shim.resolve("a/b.txt"), PathBuf::from("/workdir/a/b.txt"));
    }

    #[test]
    fn resolve_passes_absolute_and_traversal_through() {
        let shim = ExecutionShim::new(ShimConfig::new("/workdir"));
        assert_eq!(shim.resolve("/etc/hostname"), PathBuf::from("/etc/hostname"));
        assert_eq!(
            shim.resolve("../etc/passwd"),
            PathBuf::from("/workdir/../etc/passwd")
        );
    }

    #[test]
    fn timeout_is_clamped() {
        let config = ShimConfig::new("/w")
            .with_timeouts(Duration::from_secs(10), Duration::from_secs(30));
        let shim = ExecutionShim::new(config);
        assert_eq!(shim.effective_timeout(None), Duration::from_secs(10));
        assert_eq!(
            shim.effective_timeout(Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
        assert_eq!(
            shim.effective_timeout(Some(Duration::from_secs(999))),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn defaults_match_container_layout() {
        let config = ShimConfig::default();
        assert_eq!(config.root, PathBuf::from("/workdir"));
        assert_eq!(config.shell, "bash");
        assert_eq!(config.max_output_bytes, 65536);
    }
}
