//! Session transcript.
//!
//! The append-only record of everything said and done in one session. The
//! agent loop is its only writer; the front end reads it to render the trace
//! and dumps it as JSON when a session fails.

use crate::messages::{Message, ToolCall, ToolResult, ToolStatus};
use crate::types::SessionId;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;

/// Ordered, append-only message log of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    session_id: SessionId,
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
        }
    }

    /// Returns the owning session's ID.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Appends a system message.
    pub fn push_system(&mut self, content: impl Into<String>) {
        self.messages.push(Message::system(content));
    }

    /// Appends a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Appends an assistant message with its tool calls.
    pub fn push_assistant(&mut self, content: impl Into<String>, tool_calls: Vec<ToolCall>) {
        self.messages
            .push(Message::assistant_with_tools(content, tool_calls));
    }

    /// Appends a tool result.
    pub fn push_tool_result(&mut self, result: ToolResult) {
        self.messages.push(Message::ToolResult(result));
    }

    /// Returns all messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the text of the last assistant message, if any.
    #[must_use]
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|msg| match msg {
            Message::Assistant { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Tool calls of the last assistant message that have no result yet.
    #[must_use]
    pub fn pending_calls(&self) -> Vec<&ToolCall> {
        let Some(position) = self
            .messages
            .iter()
            .rposition(|msg| matches!(msg, Message::Assistant { .. }))
        else {
            return Vec::new();
        };

        let answered: HashSet<&str> = self.messages[position + 1..]
            .iter()
            .filter_map(|msg| match msg {
                Message::ToolResult(result) => Some(result.call_id.as_str()),
                _ => None,
            })
            .collect();

        self.messages[position]
            .tool_calls()
            .iter()
            .filter(|call| !answered.contains(call.id.as_str()))
            .collect()
    }

    /// Total tool calls requested across the session.
    #[must_use]
    pub fn tool_call_count(&self) -> usize {
        self.messages.iter().map(|msg| msg.tool_calls().len()).sum()
    }

    /// Total tool results recorded across the session.
    #[must_use]
    pub fn tool_result_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|msg| matches!(msg, Message::ToolResult(_)))
            .count()
    }

    /// Renders the execution trace as Markdown.
    ///
    /// System and user messages are omitted; the front end shows the goal
    /// itself.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut blocks = Vec::new();
        for msg in &self.messages {
            match msg {
                Message::System { .. } | Message::User { .. } => {}
                Message::Assistant {
                    content,
                    tool_calls,
                } => {
                    if !content.trim().is_empty() {
                        blocks.push(format!("**Assistant**\n\n{}", content.trim()));
                    }
                    for call in tool_calls {
                        blocks.push(render_call(call));
                    }
                }
                Message::ToolResult(result) => blocks.push(render_result(result)),
            }
        }
        blocks.join("\n\n")
    }

    /// Serializes the transcript for diagnosis.
    ///
    /// # Errors
    ///
    /// Returns the serde error if a message cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Renders one tool call with pretty-printed arguments.
pub fn render_call(call: &ToolCall) -> String {
    let arguments =
        serde_json::to_string_pretty(&call.arguments).unwrap_or_else(|_| call.arguments.to_string());
    format!("**Tool call** `{}`\n{}", call.name, fenced("json", &arguments))
}

/// Renders one tool result with its status.
pub fn render_result(result: &ToolResult) -> String {
    let status = match result.status {
        ToolStatus::Success => "ok".to_string(),
        ToolStatus::Failed { exit_code } => format!("exit code {exit_code}"),
        ToolStatus::Error { code } => format!("error: {code}"),
    };
    format!(
        "**Tool result** `{}` ({status})\n{}",
        result.tool_name,
        fenced("", &result.output)
    )
}

/// Wraps `body` in a code fence longer than any backtick run inside it.
fn fenced(lang: &str, body: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in body.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat(longest.max(2) + 1);
    let mut out = String::new();
    let _ = write!(out, "{fence}{lang}\n{}", body.trim_end_matches('\n'));
    let _ = write!(out, "\n{fence}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolErrorCode;
    use serde_json::json;

    fn call(id: &str) -> ToolCall {
        ToolCall::new(id, "run_shell", json!({"command": "ls"}))
    }

    fn transcript() -> Transcript {
        let mut t = Transcript::new(SessionId::new());
        t.push_system("sys");
        t.push_user("goal");
        t
    }

    #[test]
    fn pending_calls_tracks_unanswered() {
        let mut t = transcript();
        assert!(t.pending_calls().is_empty());

        t.push_assistant("", vec![call("a"), call("b")]);
        assert_eq!(t.pending_calls().len(), 2);

        t.push_tool_result(ToolResult::success(&call("a"), "ok"));
        let pending: Vec<_> = t.pending_calls().iter().map(|c| c.id.clone()).collect();
        assert_eq!(pending, vec!["b"]);

        t.push_tool_result(ToolResult::failed(&call("b"), "", 1));
        assert!(t.pending_calls().is_empty());
        assert_eq!(t.tool_call_count(), 2);
        assert_eq!(t.tool_result_count(), 2);
    }

    #[test]
    fn only_last_assistant_message_counts_as_pending() {
        let mut t = transcript();
        t.push_assistant("", vec![call("a")]);
        t.push_tool_result(ToolResult::success(&call("a"), "ok"));
        t.push_assistant("done", vec![]);
        assert!(t.pending_calls().is_empty());
        assert_eq!(t.last_assistant_text(), Some("done"));
    }

    #[test]
    fn markdown_renders_trace() {
        let mut t = transcript();
        t.push_assistant("Listing files", vec![call("a")]);
        t.push_tool_result(ToolResult::error(&call("a"), ToolErrorCode::Timeout, "timed out"));
        let md = t.to_markdown();

        assert!(!md.contains("goal"));
        assert!(md.contains("**Assistant**\n\nListing files"));
        assert!(md.contains("**Tool call** `run_shell`\n```json\n{\n  \"command\": \"ls\"\n}\n```"));
        assert!(md.contains("**Tool result** `run_shell` (error: timeout)\n```\ntimed out\n```"));
    }

    #[test]
    fn fence_grows_past_backticks_in_body() {
        let text = fenced("", "has ``` inside");
        assert!(text.starts_with("````\n"));
        assert!(text.ends_with("\n````"));
    }

    #[test]
    fn json_dump_includes_session_and_roles() {
        let t = transcript();
        let json: serde_json::Value = serde_json::from_str(&t.to_json().unwrap()).unwrap();
        assert!(json["session_id"].as_str().unwrap().starts_with("sess_"));
        assert_eq!(json["messages"][1]["role"], "user");
    }
}
