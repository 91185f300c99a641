//! Agent loop configuration.

use crate::llm::RetryConfig;
use std::path::PathBuf;

/// Default cap on completion round trips per session.
pub const DEFAULT_MAX_TURNS: u32 = 40;

/// Configuration for an [`Agent`](crate::agent::Agent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Maximum completion round trips per session
    pub max_turns: u32,
    /// Retry policy for transient endpoint errors
    pub retry: RetryConfig,
    /// Workspace root named in the system prompt
    pub workspace_root: PathBuf,
    /// Extra instructions appended to the system prompt
    pub instructions: Option<String>,
}

impl AgentConfig {
    /// Creates a configuration for the given workspace root.
    ///
    /// # Examples
    ///
    /// ```
    /// use dind_agent::agent::AgentConfig;
    ///
    /// let config = AgentConfig::new("/workdir").with_max_turns(10);
    /// assert_eq!(config.max_turns, 10);
    /// ```
    #[must_use]
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            retry: RetryConfig::default(),
            workspace_root: workspace_root.into(),
            instructions: None,
        }
    }

    /// Sets the turn budget.
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Sets the endpoint retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Appends extra instructions to the system prompt.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new("/workdir")
    }
}
