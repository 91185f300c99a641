//! Tool specification and executor traits.
//!
//! A [`ToolSpec`] is what the model sees: a name, a description and a typed
//! argument schema. A [`ToolExecutor`] is what the registry runs once the
//! arguments have been validated against that schema.

use crate::messages::ToolDefinition;
use crate::tools::error::ToolError;
use crate::tools::schema::ArgumentSchema;
use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

/// A tool's name, description and argument schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Unique tool name
    pub name: &'static str,
    /// Human-readable description shown to the model
    pub description: &'static str,
    /// Typed argument schema
    pub schema: ArgumentSchema,
}

impl ToolSpec {
    /// Creates a new tool spec.
    #[must_use]
    pub fn new(name: &'static str, description: &'static str, schema: ArgumentSchema) -> Self {
        Self {
            name,
            description,
            schema,
        }
    }

    /// Converts the spec into the wire form sent to the completion endpoint.
    #[must_use]
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: self.schema.to_json_schema(),
        }
    }
}

/// Successful output of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Text handed back to the model
    pub content: String,
    /// Process exit code, for tools that run a process
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    /// Output of a tool that does not run a process.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            exit_code: None,
        }
    }

    /// Output of a process that ran to completion.
    #[must_use]
    pub fn with_exit_code(content: impl Into<String>, exit_code: i32) -> Self {
        Self {
            content: content.into(),
            exit_code: Some(exit_code),
        }
    }

    /// Returns true unless a process exited non-zero.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code.is_none_or(|code| code == 0)
    }
}

/// The result type for tool execution futures.
pub type ToolExecutionFuture =
    Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + 'static>>;

/// Trait for executing tools.
///
/// The registry validates arguments against [`ToolExecutor::spec`] before
/// calling [`ToolExecutor::execute`], so implementations may assume required
/// keys are present with the declared JSON types.
///
/// # Example
///
/// ```rust
/// use dind_agent::tools::{ArgumentSchema, ToolExecutionFuture, ToolExecutor, ToolOutput, ToolSpec};
/// use serde_json::Value;
///
/// #[derive(Debug)]
/// struct EchoTool;
///
/// impl ToolExecutor for EchoTool {
///     fn spec(&self) -> ToolSpec {
///         ToolSpec::new("echo", "Echoes its arguments", ArgumentSchema::new())
///     }
///
///     fn execute(&self, args: Value) -> ToolExecutionFuture {
///         Box::pin(async move { Ok(ToolOutput::text(args.to_string())) })
///     }
/// }
/// ```
pub trait ToolExecutor: Send + Sync + Debug {
    /// Returns the tool's specification.
    fn spec(&self) -> ToolSpec;

    /// Executes the tool with already-validated arguments.
    fn execute(&self, args: Value) -> ToolExecutionFuture;
}

/// A shared tool executor for dynamic dispatch.
pub type SharedToolExecutor = std::sync::Arc<dyn ToolExecutor>;
