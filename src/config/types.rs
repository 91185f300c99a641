//! Configuration file types and their resolution into runtime settings.

use crate::agent::{AgentConfig, DEFAULT_MAX_TURNS};
use crate::error::DindError;
use crate::llm::{ProviderConfig, RetryConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::logging::LoggingConfig;
use crate::search::{http_client, SearXNG, SearchProvider, Tavily};
use crate::shim::{ShimConfig, DEFAULT_MAX_OUTPUT_BYTES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Root configuration structure.
///
/// Every field has a default, so an empty file is a valid configuration:
///
/// ```toml
/// workspace_root = "/workdir"
/// max_turns = 40
/// endpoint_retries = 2
///
/// [provider]
/// model = "o4-mini"
/// api_key_env = "OPENAI_API_KEY"
///
/// [shell]
/// program = "bash"
/// timeout_secs = 120
///
/// [search]
/// provider = "searxng"
/// base_url = "http://localhost:8080"
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DindConfig {
    /// Directory relative paths resolve against; named in the system prompt.
    pub workspace_root: PathBuf,
    /// Completion round trips allowed per session.
    pub max_turns: u32,
    /// Retries for transient endpoint errors before a session fails.
    pub endpoint_retries: u32,
    /// Extra text appended to the system prompt.
    pub instructions: Option<String>,
    /// Completion endpoint settings.
    pub provider: ProviderFileConfig,
    /// Shell execution settings.
    pub shell: ShellFileConfig,
    /// Web search settings.
    pub search: SearchFileConfig,
    /// File logging settings.
    pub logging: LoggingConfig,
}

impl Default for DindConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("/workdir"),
            max_turns: DEFAULT_MAX_TURNS,
            endpoint_retries: RetryConfig::default().max_retries,
            instructions: None,
            provider: ProviderFileConfig::default(),
            shell: ShellFileConfig::default(),
            search: SearchFileConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DindConfig {
    /// Checks value ranges that the TOML schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid field.
    pub fn validate(&self) -> Result<(), DindError> {
        if self.max_turns == 0 {
            return Err(DindError::configuration("max_turns", "must be at least 1"));
        }
        if self.provider.model.trim().is_empty() {
            return Err(DindError::configuration("provider.model", "cannot be empty"));
        }
        if self.provider.timeout_secs == 0 {
            return Err(DindError::configuration(
                "provider.timeout_secs",
                "must be at least 1",
            ));
        }
        if self.shell.program.trim().is_empty() {
            return Err(DindError::configuration("shell.program", "cannot be empty"));
        }
        if self.shell.timeout_secs == 0 {
            return Err(DindError::configuration("shell.timeout_secs", "must be at least 1"));
        }
        if self.shell.max_timeout_secs < self.shell.timeout_secs {
            return Err(DindError::configuration(
                "shell.max_timeout_secs",
                format!(
                    "must be at least shell.timeout_secs ({})",
                    self.shell.timeout_secs
                ),
            ));
        }
        if self.shell.max_output_bytes == 0 {
            return Err(DindError::configuration(
                "shell.max_output_bytes",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Builds the agent loop settings.
    #[must_use]
    pub fn agent_config(&self) -> AgentConfig {
        let mut config = AgentConfig::new(&self.workspace_root)
            .with_max_turns(self.max_turns)
            .with_retry(RetryConfig::new(self.endpoint_retries));
        if let Some(ref instructions) = self.instructions {
            config = config.with_instructions(instructions.clone());
        }
        config
    }

    /// Builds the execution shim settings.
    #[must_use]
    pub fn shim_config(&self) -> ShimConfig {
        ShimConfig::new(&self.workspace_root)
            .with_shell(self.shell.program.clone())
            .with_timeouts(
                Duration::from_secs(self.shell.timeout_secs),
                Duration::from_secs(self.shell.max_timeout_secs),
            )
            .with_max_output_bytes(self.shell.max_output_bytes)
    }

    /// Builds the endpoint settings, reading the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no key is configured and the named
    /// environment variable is unset or empty.
    pub fn provider_config(&self) -> Result<ProviderConfig, DindError> {
        self.provider_config_with(|var| std::env::var(var).ok())
    }

    /// Like [`provider_config`](Self::provider_config) with a custom
    /// environment lookup.
    ///
    /// # Errors
    ///
    /// See [`provider_config`](Self::provider_config).
    pub fn provider_config_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderConfig, DindError> {
        let provider = &self.provider;
        let api_key = match provider.api_key {
            Some(ref key) => key.clone(),
            None => env(&provider.api_key_env)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| DindError::missing_env(&provider.api_key_env))?,
        };

        Ok(ProviderConfig::openai(api_key)
            .with_base_url(provider.base_url.clone())
            .with_model(provider.model.clone())
            .with_max_tokens(provider.max_tokens)
            .with_timeout(Duration::from_secs(provider.timeout_secs)))
    }

    /// Builds the configured web search provider.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if Tavily is selected without a key or
    /// the HTTP client cannot be built.
    pub fn search_provider(&self) -> Result<Arc<dyn SearchProvider>, DindError> {
        self.search_provider_with(|var| std::env::var(var).ok())
    }

    /// Like [`search_provider`](Self::search_provider) with a custom
    /// environment lookup.
    ///
    /// # Errors
    ///
    /// See [`search_provider`](Self::search_provider).
    pub fn search_provider_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Arc<dyn SearchProvider>, DindError> {
        let search = &self.search;
        let client = http_client(Duration::from_secs(search.timeout_secs))
            .map_err(|e| DindError::configuration("search", format!("HTTP client: {e}")))?;

        match search.provider {
            SearchBackend::Searxng => {
                let mut provider = SearXNG::new(client, search.base_url.clone());
                if let Some(ref engines) = search.engines {
                    provider = provider.with_engines(engines.clone());
                }
                Ok(Arc::new(provider))
            }
            SearchBackend::Tavily => {
                let key = env(&search.api_key_env)
                    .filter(|value| !value.trim().is_empty())
                    .ok_or_else(|| DindError::missing_env(&search.api_key_env))?;
                Ok(Arc::new(Tavily::new(client, key)))
            }
        }
    }
}

/// `[provider]` section: an OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderFileConfig {
    /// Base URL of the API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Direct API key value (discouraged; use `api_key_env`). Set it to any
    /// placeholder for local endpoints that take no key.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum tokens per response.
    pub max_tokens: u32,
}

impl Default for ProviderFileConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            timeout_secs: 120,
            max_tokens: 4096,
        }
    }
}

/// `[shell]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellFileConfig {
    /// Shell invoked as `<program> -c <command>`.
    pub program: String,
    /// Timeout when the model does not ask for one.
    pub timeout_secs: u64,
    /// Upper bound on a requested timeout.
    pub max_timeout_secs: u64,
    /// Cap on captured bytes per output stream.
    pub max_output_bytes: usize,
}

impl Default for ShellFileConfig {
    fn default() -> Self {
        Self {
            program: "bash".to_string(),
            timeout_secs: 120,
            max_timeout_secs: 600,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// Which web search backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// Self-hosted SearXNG instance; no key.
    #[default]
    Searxng,
    /// Tavily API; needs a key.
    Tavily,
}

/// `[search]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchFileConfig {
    /// Backend selection.
    pub provider: SearchBackend,
    /// SearXNG instance URL.
    pub base_url: String,
    /// Comma-separated SearXNG engines.
    pub engines: Option<String>,
    /// Environment variable holding the Tavily key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchFileConfig {
    fn default() -> Self {
        Self {
            provider: SearchBackend::default(),
            base_url: "http://localhost:8080".to_string(),
            engines: None,
            api_key_env: "TAVILY_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}
