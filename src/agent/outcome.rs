//! Session results and progress events.

use crate::agent::LoopState;
use crate::llm::LLMError;
use crate::messages::{ToolCall, ToolResult};
use crate::transcript::Transcript;
use crate::types::SessionId;
use std::fmt;

/// Why a session ended without a final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The turn budget ran out; a soft stop, not an error
    BudgetExceeded {
        /// Round trips performed
        turns: u32,
    },
    /// The completion endpoint failed after retries
    Endpoint(LLMError),
    /// The caller cancelled the session
    Cancelled,
}

impl FailureReason {
    /// Returns true for stops that are not errors.
    #[must_use]
    pub fn is_soft_stop(&self) -> bool {
        matches!(self, Self::BudgetExceeded { .. })
    }

    /// Returns true if the turn budget ran out.
    #[must_use]
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, Self::BudgetExceeded { .. })
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetExceeded { turns } => write!(
                f,
                "turn budget exhausted after {turns} round trips; raise max_turns or narrow the goal"
            ),
            Self::Endpoint(error) => write!(f, "completion endpoint failed: {error}"),
            Self::Cancelled => write!(f, "session cancelled"),
        }
    }
}

/// Terminal status of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// The model produced a final answer
    Done {
        /// The final assistant text
        answer: String,
    },
    /// The session stopped early
    Failed {
        /// Why it stopped
        reason: FailureReason,
    },
}

/// Everything a finished session leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    /// The session's ID
    pub session_id: SessionId,
    /// Completion round trips performed
    pub turns: u32,
    /// Terminal status
    pub status: SessionStatus,
    /// The full message log
    pub transcript: Transcript,
}

impl SessionOutcome {
    /// Returns the final loop state (`Done` or `Failed`).
    #[must_use]
    pub fn state(&self) -> LoopState {
        match self.status {
            SessionStatus::Done { .. } => LoopState::Done,
            SessionStatus::Failed { .. } => LoopState::Failed,
        }
    }

    /// Returns true if the session reached `Done`.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.status, SessionStatus::Done { .. })
    }

    /// Returns the final answer, if any.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        match &self.status {
            SessionStatus::Done { answer } => Some(answer),
            SessionStatus::Failed { .. } => None,
        }
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.status {
            SessionStatus::Done { .. } => None,
            SessionStatus::Failed { reason } => Some(reason),
        }
    }
}

/// Progress reported while a session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A completion request is about to be sent
    TurnStarted {
        /// 1-based round trip number
        turn: u32,
    },
    /// The model produced text
    AssistantText {
        /// Round trip that produced it
        turn: u32,
        /// The text
        text: String,
    },
    /// A tool call is about to execute
    ToolCallStarted(ToolCall),
    /// A tool call produced its result
    ToolCallFinished(ToolResult),
    /// The session ended; always the last event
    Finished(Box<SessionOutcome>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn only_budget_exceeded_is_soft() {
        assert!(FailureReason::BudgetExceeded { turns: 3 }.is_soft_stop());
        assert!(!FailureReason::Cancelled.is_soft_stop());
        assert!(!FailureReason::Endpoint(LLMError::timeout(Duration::from_secs(1))).is_soft_stop());
    }

    #[test]
    fn failure_display_is_actionable() {
        let text = FailureReason::BudgetExceeded { turns: 40 }.to_string();
        assert!(text.contains("40 round trips"));
        assert!(text.contains("max_turns"));
    }

    #[test]
    fn outcome_accessors() {
        let outcome = SessionOutcome {
            session_id: SessionId::new(),
            turns: 1,
            status: SessionStatus::Done {
                answer: "done".into(),
            },
            transcript: Transcript::new(SessionId::new()),
        };
        assert!(outcome.is_done());
        assert_eq!(outcome.state(), LoopState::Done);
        assert_eq!(outcome.answer(), Some("done"));
        assert!(outcome.failure().is_none());
    }
}
