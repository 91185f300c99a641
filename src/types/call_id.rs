//! Tool call identifier type using TypeID format.
//!
//! Completion endpoints normally assign their own call IDs. When a response
//! carries a tool call without one, the agent loop mints a `CallId` so every
//! call still pairs with exactly one result. Format: `call_01h455vb4pex5vsknk084sn02q`

use mti::prelude::*;
use std::fmt;

/// A locally generated tool call identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallId(MagicTypeId);

impl CallId {
    /// The TypeID prefix for call identifiers.
    pub const PREFIX: &'static str = "call";

    /// Creates a new call ID with a fresh UUIDv7.
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CallId> for String {
    fn from(id: CallId) -> Self {
        id.to_string()
    }
}
