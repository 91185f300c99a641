//! Write file built-in tool.
//!
//! Writes or appends content, creating parent directories if needed.

use crate::shim::{ExecutionShim, WriteMode};
use crate::tools::schema::{ArgKind, ArgumentSchema};
use crate::tools::{ToolError, ToolExecutionFuture, ToolExecutor, ToolOutput, ToolSpec};
use serde_json::Value;
use std::sync::Arc;

/// Writes a file through the shim.
#[derive(Debug, Clone)]
pub struct WriteFileTool {
    shim: Arc<ExecutionShim>,
}

impl WriteFileTool {
    /// Creates the tool over a shared shim.
    #[must_use]
    pub fn new(shim: Arc<ExecutionShim>) -> Self {
        Self { shim }
    }
}

impl ToolExecutor for WriteFileTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "write_file",
            "Create or overwrite a file with the supplied content, or append to it. \
             Parent directories are created as needed.",
            ArgumentSchema::new()
                .required("path", ArgKind::String, "Path of the file to write")
                .required("content", ArgKind::String, "Content to write")
                .optional(
                    "mode",
                    ArgKind::Enum(&["overwrite", "append"]),
                    "Write mode (default: overwrite)",
                ),
        )
    }

    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let shim = Arc::clone(&self.shim);

        Box::pin(async move {
            let path = args["path"].as_str().unwrap_or_default();
            if path.is_empty() {
                return Err(ToolError::invalid_arguments("write_file", "path cannot be empty"));
            }
            let content = args["content"].as_str().unwrap_or_default();
            let mode = args
                .get("mode")
                .and_then(Value::as_str)
                .and_then(WriteMode::parse)
                .unwrap_or_default();

            let report = shim.write_file(path, content.as_bytes(), mode).await?;
            Ok(ToolOutput::text(report.to_string()))
        })
    }
}
