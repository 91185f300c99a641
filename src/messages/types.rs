//! Core message type definitions.
//!
//! A session's conversation is a sequence of [`Message`]s. The tagged union
//! mirrors the four roles a completion endpoint understands: system, user,
//! assistant (optionally carrying tool calls) and tool result.

use crate::tools::ToolErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Conversation Messages
// =============================================================================

/// A message in a session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// System instructions (tool descriptions, safety preamble)
    System {
        /// The instruction text
        content: String,
    },
    /// User input; the session goal
    User {
        /// The goal text
        content: String,
    },
    /// Model output, possibly requesting tools
    Assistant {
        /// Natural-language text (may be empty when only tools are requested)
        content: String,
        /// Tool calls requested in this turn, in emitted order
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Observation produced by executing one tool call
    ToolResult(ToolResult),
}

impl Message {
    /// Creates a new system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Creates a new user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates a new assistant message without tool calls.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Creates a new assistant message with tool calls.
    #[must_use]
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Returns the role of this message.
    #[must_use]
    pub fn role(&self) -> MessageRole {
        match self {
            Self::System { .. } => MessageRole::System,
            Self::User { .. } => MessageRole::User,
            Self::Assistant { .. } => MessageRole::Assistant,
            Self::ToolResult(_) => MessageRole::Tool,
        }
    }

    /// Returns the tool calls carried by an assistant message.
    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions
    System,
    /// User input
    User,
    /// Assistant response
    Assistant,
    /// Tool response
    Tool,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// The reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Normal completion
    EndTurn,
    /// Reached maximum tokens
    MaxTokens,
    /// Model wants to call tools
    ToolUse,
    /// A stop sequence matched or the provider filtered the output
    StopSequence,
}

// =============================================================================
// Tool Messages
// =============================================================================

/// Definition of a tool as sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the tool's input parameters
    pub input_schema: serde_json::Value,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier pairing this call with its result
    pub id: String,
    /// The name of the tool to call
    pub name: String,
    /// The arguments to pass to the tool (a JSON object when well-formed)
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Creates a tool call.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome classification of one tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolStatus {
    /// The tool completed; for shell commands the exit code was zero
    Success,
    /// A shell command ran to completion with a non-zero exit code
    Failed {
        /// The process exit code (-1 when killed by a signal)
        exit_code: i32,
    },
    /// The call never produced a normal result
    Error {
        /// What went wrong
        code: ToolErrorCode,
    },
}

impl ToolStatus {
    /// Returns true for [`ToolStatus::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true for [`ToolStatus::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Returns the exit status in shell terms, if there is one.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Success => Some(0),
            Self::Failed { exit_code } => Some(*exit_code),
            Self::Error { .. } => None,
        }
    }
}

/// The observation recorded for exactly one [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The ID of the call this result answers
    pub call_id: String,
    /// The tool name as requested (kept even when it was unknown)
    pub tool_name: String,
    /// Output text, or the error message when `status` is an error
    pub output: String,
    /// Outcome classification
    #[serde(flatten)]
    pub status: ToolStatus,
}

impl ToolResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(call: &ToolCall, output: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            output: output.into(),
            status: ToolStatus::Success,
        }
    }

    /// Creates a result for a command that exited non-zero.
    #[must_use]
    pub fn failed(call: &ToolCall, output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            output: output.into(),
            status: ToolStatus::Failed { exit_code },
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(call: &ToolCall, code: ToolErrorCode, message: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            output: message.into(),
            status: ToolStatus::Error { code },
        }
    }

    /// Renders the result as the text the model sees in the `tool` role.
    #[must_use]
    pub fn to_model_content(&self) -> String {
        match self.status {
            ToolStatus::Success => self.output.clone(),
            ToolStatus::Failed { exit_code } => {
                format!("[exit code {exit_code}]\n{}", self.output)
            }
            ToolStatus::Error { code } => format!("[error: {code}] {}", self.output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call() -> ToolCall {
        ToolCall::new("tc_1", "run_shell", json!({"command": "ls"}))
    }

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(Message::system("s").role(), MessageRole::System);
        assert_eq!(Message::user("u").role(), MessageRole::User);
        assert_eq!(Message::assistant("a").role(), MessageRole::Assistant);
        assert_eq!(
            Message::ToolResult(ToolResult::success(&call(), "ok")).role(),
            MessageRole::Tool
        );
    }

    #[test]
    fn assistant_tool_calls_accessor() {
        let msg = Message::assistant_with_tools("running", vec![call()]);
        assert_eq!(msg.tool_calls().len(), 1);
        assert!(Message::user("hi").tool_calls().is_empty());
    }

    #[test]
    fn message_role_display() {
        assert_eq!(MessageRole::System.to_string(), "system");
        assert_eq!(MessageRole::User.to_string(), "user");
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
        assert_eq!(MessageRole::Tool.to_string(), "tool");
    }

    #[test]
    fn message_serializes_with_role_tag() {
        let json = serde_json::to_value(Message::user("build it")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "build it"}));

        let json = serde_json::to_value(Message::assistant("done")).unwrap();
        assert!(json.get("tool_calls").is_none());
    }

    #[test]
    fn tool_result_serializes_flat_status() {
        let result = ToolResult::failed(&call(), "boom", 2);
        let json = serde_json::to_value(Message::ToolResult(result.clone())).unwrap();
        assert_eq!(json["role"], "tool_result");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["exit_code"], 2);

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, Message::ToolResult(result));
    }

    #[test]
    fn tool_result_pairs_with_call() {
        let result = ToolResult::error(&call(), ToolErrorCode::Timeout, "too slow");
        assert_eq!(result.call_id, "tc_1");
        assert_eq!(result.tool_name, "run_shell");
        assert!(result.status.is_error());
        assert_eq!(result.status.exit_code(), None);
    }

    #[test]
    fn model_content_marks_failures() {
        assert_eq!(ToolResult::success(&call(), "fine").to_model_content(), "fine");
        assert!(ToolResult::failed(&call(), "nope", 1)
            .to_model_content()
            .starts_with("[exit code 1]"));
        assert!(ToolResult::error(&call(), ToolErrorCode::UnknownTool, "x")
            .to_model_content()
            .starts_with("[error: unknown_tool]"));
    }
}
