//! Message types exchanged between the agent loop, the transcript and the
//! completion endpoint.

mod types;

pub use types::*;
