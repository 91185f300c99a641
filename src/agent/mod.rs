//! The agent loop and its session surface.
//!
//! An [`Agent`] pairs a [`CompletionClient`](crate::llm::CompletionClient)
//! with a [`ToolRegistry`](crate::tools::ToolRegistry). Each session it runs
//! owns an append-only [`Transcript`](crate::transcript::Transcript) and
//! moves through the [`LoopState`] machine until it is `Done` or `Failed`.
//!
//! Tool calls are executed one at a time, in the order the model emitted
//! them, and every call gets exactly one result before the next completion
//! request. Tool errors are returned to the model as results; only endpoint
//! failures, the turn budget and cancellation end a session early.

mod config;
mod handle;
mod outcome;
mod prompt;
mod session;
mod state;

pub use config::{AgentConfig, DEFAULT_MAX_TURNS};
pub use handle::{Canceller, SessionHandle};
pub use outcome::{FailureReason, SessionEvent, SessionOutcome, SessionStatus};
pub use prompt::system_prompt;
pub use session::Agent;
pub use state::LoopState;
