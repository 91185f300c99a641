//! Configuration loading.
//!
//! Configuration is stored in TOML. The search order is:
//! 1. `./dind-agent.toml` (project-local)
//! 2. `~/.config/dind-agent/config.toml` (XDG config)
//!
//! Every field has a default, so running without a file works as long as
//! the API key variable (`OPENAI_API_KEY` unless configured otherwise) is
//! set. A missing key is a fatal [`DindError`](crate::error::DindError)
//! raised before any session starts.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dind_agent::config;
//!
//! let config = config::load()?;
//! let provider = config.provider_config()?;
//! let agent_config = config.agent_config();
//! ```

mod file;
mod types;

pub use file::{from_path, from_str, load, search_paths, xdg_config_dir};
pub use types::{DindConfig, ProviderFileConfig, SearchBackend, SearchFileConfig, ShellFileConfig};
