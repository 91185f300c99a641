//! Core identifier types for dind-agent.
//!
//! - [`SessionId`]: one per goal-to-completion session
//! - [`CallId`]: minted for tool calls the endpoint left without an ID

mod call_id;
mod session_id;

pub use call_id::CallId;
pub use session_id::{InvalidSessionId, SessionId};
