//! Completion endpoint module.
//!
//! The [`CompletionClient`] trait the agent loop calls, its OpenAI-compatible
//! HTTP implementation, and the endpoint error and retry types.

mod client;
mod config;
mod error;
mod openai;

pub use client::{Completion, CompletionClient};
pub use config::{ProviderConfig, RetryConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::{LLMError, LLMErrorKind};
pub use openai::OpenAIClient;
