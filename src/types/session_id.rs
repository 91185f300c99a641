//! Session identifier type using TypeID format.
//!
//! Every agent session gets a `SessionId` at goal submission. It tags log
//! lines and transcript dumps. Format: `sess_01h455vb4pex5vsknk084sn02q`

use mti::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A validated session identifier.
///
/// Uses TypeID format for human-readable, time-sortable, globally unique IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(MagicTypeId);

/// Error returned when attempting to parse an invalid session ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidSessionId {
    /// TypeID parsing failed
    Parse(String),
    /// Wrong prefix (expected "sess")
    WrongPrefix {
        /// The expected prefix
        expected: &'static str,
        /// The actual prefix found
        actual: String,
    },
}

impl fmt::Display for InvalidSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "invalid session ID: {e}"),
            Self::WrongPrefix { expected, actual } => {
                write!(f, "expected prefix '{expected}', got '{actual}'")
            }
        }
    }
}

impl std::error::Error for InvalidSessionId {}

impl SessionId {
    /// The TypeID prefix for session identifiers.
    pub const PREFIX: &'static str = "sess";

    /// Creates a new session ID with a fresh UUIDv7.
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    /// Parses a session ID from a string, validating the prefix.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSessionId::Parse` if the string is not a valid TypeID.
    /// Returns `InvalidSessionId::WrongPrefix` if the TypeID has a different prefix.
    pub fn parse(s: &str) -> Result<Self, InvalidSessionId> {
        let id = MagicTypeId::from_str(s).map_err(|e| InvalidSessionId::Parse(e.to_string()))?;

        let prefix = id.prefix().as_str();
        if prefix != Self::PREFIX {
            return Err(InvalidSessionId::WrongPrefix {
                expected: Self::PREFIX,
                actual: prefix.to_string(),
            });
        }

        Ok(Self(id))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = InvalidSessionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SessionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
