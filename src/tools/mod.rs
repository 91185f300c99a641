//! Tool system.
//!
//! - **Schema**: typed argument declarations that render to JSON Schema and
//!   validate model-supplied arguments
//! - **Registry**: name lookup, validation and dispatch; every failure becomes
//!   an error `ToolResult`
//! - **Builtins**: shell, file and web search tools over the execution shim
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                       Agent Loop                             |
//! |                                                              |
//! |  ToolCall --> ToolRegistry::dispatch --> ToolResult         |
//! |                      |                                       |
//! |           lookup / validate / execute                        |
//! |                      v                                       |
//! |  RunShell  ReadFile  WriteFile  ListDirectory  WebSearch    |
//! |       \________ ExecutionShim ________/         |            |
//! |                                          SearchProvider      |
//! +-------------------------------------------------------------+
//! ```

pub mod builtins;
pub mod definition;
pub mod error;
pub mod registry;
pub mod schema;

pub use crate::messages::ToolDefinition;
pub use definition::{SharedToolExecutor, ToolExecutionFuture, ToolExecutor, ToolOutput, ToolSpec};
pub use error::{ToolError, ToolErrorCode, ToolErrorKind};
pub use registry::ToolRegistry;
pub use schema::{ArgKind, ArgSpec, ArgumentSchema};
