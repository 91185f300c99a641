//! # dind-agent: an operational agent for Docker-in-Docker containers
//!
//! Takes a natural-language goal and pursues it by letting a chat-completion
//! model call tools (shell commands, file reads and writes, directory
//! listings, web search) until the model gives a final answer.
//!
//! ## Architecture
//!
//! - **Agent loop**: sequential `AwaitingModel -> ExecutingTool` cycle with a
//!   turn budget; tool errors are fed back to the model as data
//! - **Tool registry**: name lookup, argument validation, dispatch
//! - **Execution shim**: shell commands in their own process group with a
//!   timeout and capped output; plain file operations
//! - **Transcript**: append-only message log of one session
//! - **Completion client**: OpenAI-compatible chat completions over reqwest
//!
//! ## Isolation
//!
//! Nothing here confines the model. The workspace root is an instruction in
//! the system prompt; commands run with the container's full (privileged)
//! rights. Deploy only on a disposable, isolated host.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dind_agent::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DindError> {
//!     let config = dind_agent::config::load()?;
//!     let client = OpenAIClient::new(config.provider_config()?)?;
//!     let shim = Arc::new(ExecutionShim::new(config.shim_config()));
//!     let registry = builtin_registry(shim, config.search_provider()?);
//!
//!     let agent = Agent::new(Arc::new(client), Arc::new(registry), config.agent_config());
//!     let outcome = agent.run("List the running containers").await;
//!     println!("{:?}", outcome.answer());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod messages;
pub mod search;
pub mod shim;
pub mod tools;
pub mod transcript;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::agent::{
        Agent, AgentConfig, Canceller, FailureReason, LoopState, SessionEvent, SessionHandle,
        SessionOutcome, SessionStatus,
    };
    pub use crate::config::DindConfig;
    pub use crate::error::{DindError, DindErrorKind};
    pub use crate::llm::{Completion, CompletionClient, LLMError, OpenAIClient, ProviderConfig};
    pub use crate::messages::{Message, ToolCall, ToolResult, ToolStatus};
    pub use crate::search::{SearXNG, SearchProvider, Tavily};
    pub use crate::shim::{ExecutionShim, ShimConfig};
    pub use crate::tools::builtins::builtin_registry;
    pub use crate::tools::{ToolError, ToolRegistry};
    pub use crate::transcript::Transcript;
    pub use crate::types::{CallId, SessionId};
}
