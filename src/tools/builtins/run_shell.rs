//! Shell command execution built-in tool.

use crate::shim::ExecutionShim;
use crate::tools::schema::{ArgKind, ArgumentSchema};
use crate::tools::{ToolError, ToolExecutionFuture, ToolExecutor, ToolOutput, ToolSpec};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Runs a shell command through the shim.
#[derive(Debug, Clone)]
pub struct RunShellTool {
    shim: Arc<ExecutionShim>,
}

impl RunShellTool {
    /// Creates the tool over a shared shim.
    #[must_use]
    pub fn new(shim: Arc<ExecutionShim>) -> Self {
        Self { shim }
    }
}

impl ToolExecutor for RunShellTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "run_shell",
            "Run a shell command with bash and return its stdout, stderr and exit code. \
             Runs in the workspace root unless `cwd` is given. Docker is available. \
             Long outputs are truncated; the command is killed when it exceeds its timeout. \
             Background jobs (`cmd &`) keep running after the command returns, but their \
             output is not captured; redirect it to a file.",
            ArgumentSchema::new()
                .required("command", ArgKind::String, "The shell command to execute")
                .optional(
                    "cwd",
                    ArgKind::String,
                    "Working directory, relative to the workspace root (default: the root)",
                )
                .optional(
                    "timeout_secs",
                    ArgKind::Integer,
                    "Timeout in seconds (default 120, capped at 600)",
                ),
        )
    }

    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let shim = Arc::clone(&self.shim);

        Box::pin(async move {
            let command = args["command"].as_str().unwrap_or_default();
            if command.trim().is_empty() {
                return Err(ToolError::invalid_arguments("run_shell", "command cannot be empty"));
            }

            let timeout = match args.get("timeout_secs").and_then(Value::as_i64) {
                Some(secs) if secs <= 0 => {
                    return Err(ToolError::invalid_arguments(
                        "run_shell",
                        "timeout_secs must be positive",
                    ));
                }
                Some(secs) => Some(Duration::from_secs(secs.unsigned_abs())),
                None => None,
            };
            let cwd = args.get("cwd").and_then(Value::as_str);

            let output = shim.run_shell(command, cwd, timeout).await?;
            Ok(ToolOutput::with_exit_code(output.render(), output.exit_code))
        })
    }
}
