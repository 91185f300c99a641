//! Tool Registry.
//!
//! The registry maps tool names to executors. It validates arguments against
//! each tool's schema before running it and converts every failure into an
//! error [`ToolResult`] so the agent loop can feed it back to the model.

use crate::messages::{ToolCall, ToolDefinition, ToolResult};
use crate::tools::definition::{SharedToolExecutor, ToolOutput, ToolSpec};
use crate::tools::error::ToolError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Instant;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Registry of tools available to a session.
///
/// Tools are kept in a `BTreeMap`, so listing order is by name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, SharedToolExecutor>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under the name in its spec.
    ///
    /// A tool registered under an existing name replaces the earlier one.
    pub fn register(&mut self, executor: SharedToolExecutor) {
        let name = executor.spec().name;
        if self.tools.insert(name, executor).is_some() {
            tracing::warn!(tool = name, "Tool re-registered; previous executor replaced");
        } else {
            tracing::debug!(tool = name, "Tool registered");
        }
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Checks if a tool is registered.
    #[must_use]
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns every registered tool's spec, sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|tool| tool.spec()).collect()
    }

    /// Returns the tool definitions sent to the completion endpoint.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| tool.spec().to_definition())
            .collect()
    }

    /// Renders the tool list as Markdown for the system prompt.
    #[must_use]
    pub fn descriptions(&self) -> String {
        let mut out = String::new();
        for spec in self.list() {
            let _ = writeln!(out, "### {}\n\n{}\n", spec.name, spec.description);
            if spec.schema.args().is_empty() {
                out.push_str("No arguments.\n\n");
                continue;
            }
            out.push_str("Arguments:\n");
            for arg in spec.schema.args() {
                let _ = writeln!(
                    out,
                    "- `{}` ({}{}): {}",
                    arg.name,
                    arg.kind.json_type(),
                    if arg.required { ", required" } else { "" },
                    arg.description
                );
            }
            out.push('\n');
        }
        out
    }

    /// Validates and executes a tool.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool` if `name` is not registered (nothing executes),
    /// `InvalidArguments` if `args` violates the schema, or whatever the tool
    /// itself returns.
    pub async fn invoke(&self, name: &str, args: &Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::unknown_tool(name, self.suggest(name)))?;

        tool.spec()
            .schema
            .validate(args)
            .map_err(|reason| ToolError::invalid_arguments(name, reason))?;

        tool.execute(args.clone()).await
    }

    /// Executes one tool call and always produces its result.
    ///
    /// Errors become [`ToolResult::error`]; a process that exits non-zero
    /// becomes [`ToolResult::failed`].
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let started = Instant::now();
        let outcome = self.invoke(&call.name, &call.arguments).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => match output.exit_code {
                Some(code) if code != 0 => {
                    tracing::info!(
                        tool = %call.name,
                        call_id = %call.id,
                        exit_code = code,
                        elapsed_ms,
                        "Tool call exited non-zero"
                    );
                    ToolResult::failed(call, output.content, code)
                }
                _ => {
                    tracing::info!(
                        tool = %call.name,
                        call_id = %call.id,
                        elapsed_ms,
                        "Tool call succeeded"
                    );
                    ToolResult::success(call, output.content)
                }
            },
            Err(error) => {
                tracing::warn!(
                    tool = %call.name,
                    call_id = %call.id,
                    code = %error.code(),
                    error = %error,
                    elapsed_ms,
                    "Tool call failed"
                );
                ToolResult::error(call, error.code(), error.to_string())
            }
        }
    }

    fn suggest(&self, name: &str) -> Option<String> {
        self.tools
            .keys()
            .map(|candidate| (candidate, strsim::jaro_winkler(name, candidate)))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| (*candidate).to_string())
    }
}
