//! Completion client trait abstraction.
//!
//! The agent loop talks to the model only through [`CompletionClient`], so a
//! scripted client can stand in for the HTTP endpoint in tests.

use crate::llm::error::LLMError;
use crate::messages::{Message, StopReason, ToolCall, ToolDefinition};
use async_trait::async_trait;

/// One model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The generated text content
    pub content: String,
    /// Tool calls requested by the model, in emitted order
    pub tool_calls: Vec<ToolCall>,
    /// The reason the model stopped generating
    pub stop_reason: StopReason,
}

impl Completion {
    /// A final answer without tool calls.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
        }
    }

    /// A response requesting tools.
    #[must_use]
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            stop_reason: StopReason::ToolUse,
        }
    }

    /// Returns true if the response requests at least one tool.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Trait for completion endpoint clients.
#[async_trait]
pub trait CompletionClient: Send + Sync + std::fmt::Debug {
    /// Sends the conversation so far and returns the model's next response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Completion, LLMError>;

    /// Returns the name of this provider for logging.
    fn provider_name(&self) -> &'static str;

    /// Returns the model identifier, if the client has one.
    fn model(&self) -> &str {
        "unknown"
    }
}
