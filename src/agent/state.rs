//! Agent loop state enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The state of one session's loop.
///
/// ```text
/// AwaitingModel --tool calls--> ExecutingTool --all answered--> AwaitingModel
/// AwaitingModel --no tool calls--> Done
/// any --budget / endpoint error / cancel--> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// A completion request is outstanding or about to be sent
    #[default]
    AwaitingModel,
    /// The calls of the last response are being executed in order
    ExecutingTool,
    /// The model produced a final answer
    Done,
    /// The session stopped without a final answer
    Failed,
}

impl LoopState {
    /// Returns true if the loop is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::AwaitingModel | Self::ExecutingTool)
    }

    /// Returns true for `Done` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingModel => write!(f, "awaiting_model"),
            Self::ExecutingTool => write!(f, "executing_tool"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
