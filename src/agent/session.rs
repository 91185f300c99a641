//! The agent loop.
//!
//! One session alternates between asking the model for its next step and
//! executing the tool calls it requested, strictly in order, until the model
//! answers without tools, the turn budget runs out, the endpoint fails or the
//! caller cancels.

use crate::agent::handle::{Canceller, SessionHandle};
use crate::agent::outcome::{FailureReason, SessionEvent, SessionOutcome, SessionStatus};
use crate::agent::{system_prompt, AgentConfig, LoopState};
use crate::llm::{Completion, CompletionClient, LLMError};
use crate::messages::{Message, ToolCall, ToolDefinition};
use crate::tools::ToolRegistry;
use crate::transcript::Transcript;
use crate::types::{CallId, SessionId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

/// Drives sessions against a completion client and a tool registry.
///
/// Cheap to clone; sessions started from the same agent share the client and
/// the registry but nothing else.
#[derive(Debug, Clone)]
pub struct Agent {
    client: Arc<dyn CompletionClient>,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Creates an agent.
    #[must_use]
    pub fn new(
        client: Arc<dyn CompletionClient>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    /// Returns the agent configuration.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Returns the tool registry.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Runs a session to completion and returns its outcome.
    pub async fn run(&self, goal: impl Into<String>) -> SessionOutcome {
        let (canceller, cancel_rx) = Canceller::new();
        let outcome = self
            .drive(goal.into(), SessionId::new(), None, cancel_rx)
            .await;
        drop(canceller);
        outcome
    }

    /// Starts a session in the background and returns its event stream.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start_session(&self, goal: impl Into<String>) -> SessionHandle {
        let session_id = SessionId::new();
        let (canceller, cancel_rx) = Canceller::new();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let agent = self.clone();
        let goal = goal.into();
        let id = session_id.clone();
        tokio::spawn(async move {
            agent.drive(goal, id, Some(event_tx), cancel_rx).await;
        });

        let events = async_stream::stream! {
            while let Some(event) = event_rx.recv().await {
                let last = matches!(event, SessionEvent::Finished(_));
                yield event;
                if last {
                    break;
                }
            }
        };

        SessionHandle::new(session_id, canceller, Box::pin(events))
    }

    async fn drive(
        &self,
        goal: String,
        session_id: SessionId,
        events: Option<mpsc::UnboundedSender<SessionEvent>>,
        cancel: watch::Receiver<bool>,
    ) -> SessionOutcome {
        let span = tracing::info_span!(
            "session",
            session_id = %session_id,
            model = %self.client.model(),
            max_turns = self.config.max_turns,
        );

        async move {
            let sink = EventSink(events);
            let mut transcript = Transcript::new(session_id.clone());
            transcript.push_system(system_prompt(
                &self.config.workspace_root,
                &self.registry,
                self.config.instructions.as_deref(),
            ));
            transcript.push_user(goal);

            let definitions = self.registry.definitions();
            let mut turns = 0u32;
            let mut state = LoopState::AwaitingModel;
            tracing::info!("Session started");

            let status = loop {
                debug_assert!(transcript.pending_calls().is_empty());
                tracing::trace!(%state, turn = turns + 1, "Loop iteration");

                if *cancel.borrow() {
                    break failed(FailureReason::Cancelled);
                }
                if turns >= self.config.max_turns {
                    break failed(FailureReason::BudgetExceeded { turns });
                }

                turns += 1;
                sink.emit(SessionEvent::TurnStarted { turn: turns });

                let completion = tokio::select! {
                    result = self.complete_with_retry(transcript.messages(), &definitions, turns) => result,
                    () = cancelled(cancel.clone()) => break failed(FailureReason::Cancelled),
                };
                let Completion {
                    content,
                    tool_calls,
                    stop_reason,
                } = match completion {
                    Ok(completion) => completion,
                    Err(error) => break failed(FailureReason::Endpoint(error)),
                };

                tracing::debug!(
                    turn = turns,
                    stop_reason = ?stop_reason,
                    tool_calls = tool_calls.len(),
                    "Completion received"
                );

                if !content.trim().is_empty() {
                    sink.emit(SessionEvent::AssistantText {
                        turn: turns,
                        text: content.clone(),
                    });
                }

                if tool_calls.is_empty() {
                    transcript.push_assistant(content.clone(), Vec::new());
                    break SessionStatus::Done { answer: content };
                }

                let tool_calls = unique_call_ids(tool_calls);
                transcript.push_assistant(content, tool_calls.clone());
                state = LoopState::ExecutingTool;
                tracing::debug!(%state, turn = turns, calls = tool_calls.len(), "Executing tool calls");

                for call in &tool_calls {
                    sink.emit(SessionEvent::ToolCallStarted(call.clone()));
                    let result = self
                        .registry
                        .dispatch(call)
                        .instrument(tracing::info_span!("tool_call", turn = turns))
                        .await;
                    sink.emit(SessionEvent::ToolCallFinished(result.clone()));
                    transcript.push_tool_result(result);
                }

                state = LoopState::AwaitingModel;
            };

            match &status {
                SessionStatus::Done { .. } => {
                    tracing::info!(turns, "Session finished with a final answer");
                }
                SessionStatus::Failed { reason } if reason.is_soft_stop() => {
                    tracing::warn!(turns, reason = %reason, "Session stopped");
                }
                SessionStatus::Failed { reason } => {
                    tracing::error!(turns, reason = %reason, "Session failed");
                }
            }

            let outcome = SessionOutcome {
                session_id,
                turns,
                status,
                transcript,
            };
            sink.emit(SessionEvent::Finished(Box::new(outcome.clone())));
            outcome
        }
        .instrument(span)
        .await
    }

    /// Sends one completion request, retrying transient failures.
    async fn complete_with_retry(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        turn: u32,
    ) -> Result<Completion, LLMError> {
        let retry = &self.config.retry;
        let mut attempt = 0;

        loop {
            match self.client.complete(messages, tools).await {
                Ok(completion) => return Ok(completion),
                Err(error) => {
                    attempt += 1;
                    let Some(delay) = error.retry_delay(attempt, retry) else {
                        return Err(error);
                    };
                    tracing::warn!(
                        turn,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Completion failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn failed(reason: FailureReason) -> SessionStatus {
    SessionStatus::Failed { reason }
}

/// Resolves once cancellation is requested or every canceller is dropped.
async fn cancelled(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|cancelled| *cancelled).await;
}

/// Gives every call in a batch a distinct, non-empty ID.
///
/// Results are paired with calls by ID, so a missing or repeated ID would make
/// the pairing ambiguous.
fn unique_call_ids(calls: Vec<ToolCall>) -> Vec<ToolCall> {
    let mut seen = HashSet::new();
    calls
        .into_iter()
        .map(|mut call| {
            if call.id.is_empty() || !seen.insert(call.id.clone()) {
                let minted = String::from(CallId::new());
                tracing::debug!(original = %call.id, minted = %minted, "Reassigned tool call ID");
                seen.insert(minted.clone());
                call.id = minted;
            }
            call
        })
        .collect()
}

struct EventSink(Option<mpsc::UnboundedSender<SessionEvent>>);

impl EventSink {
    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.0 {
            // The receiver is gone only if the handle was dropped; the
            // session keeps its outcome either way.
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_and_empty_ids_are_replaced() {
        let calls = vec![
            ToolCall::new("a", "run_shell", json!({})),
            ToolCall::new("a", "run_shell", json!({})),
            ToolCall::new("", "read_file", json!({})),
        ];
        let fixed = unique_call_ids(calls);
        assert_eq!(fixed[0].id, "a");
        assert_ne!(fixed[1].id, "a");
        assert!(!fixed[2].id.is_empty());
        let ids: HashSet<_> = fixed.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn distinct_ids_are_kept() {
        let calls = vec![
            ToolCall::new("x", "run_shell", json!({})),
            ToolCall::new("y", "run_shell", json!({})),
        ];
        let fixed = unique_call_ids(calls);
        assert_eq!(fixed[0].id, "x");
        assert_eq!(fixed[1].id, "y");
    }
}
