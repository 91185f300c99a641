//! List directory built-in tool.
//!
//! Lists directory contents with metadata.

use crate::shim::{render_capped, DirEntry, EntryKind, ExecutionShim};
use crate::tools::schema::{ArgKind, ArgumentSchema};
use crate::tools::{ToolError, ToolExecutionFuture, ToolExecutor, ToolOutput, ToolSpec};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;

/// Depth used for recursive listings when none is given.
const DEFAULT_MAX_DEPTH: usize = 3;

/// Deepest recursive listing allowed.
const MAX_DEPTH_LIMIT: usize = 10;

/// List directory tool executor.
#[derive(Debug, Clone)]
pub struct ListDirectoryTool {
    shim: Arc<ExecutionShim>,
}

impl ListDirectoryTool {
    /// Creates the tool over a shared shim.
    #[must_use]
    pub fn new(shim: Arc<ExecutionShim>) -> Self {
        Self { shim }
    }

    fn render(path: &str, entries: &[DirEntry]) -> String {
        if entries.is_empty() {
            return format!("{path} is empty");
        }
        let mut out = String::new();
        for entry in entries {
            let kind = match entry.kind {
                EntryKind::File => "file",
                EntryKind::Dir => "dir",
                EntryKind::Symlink => "symlink",
            };
            let size = entry.size.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
            let modified = entry.modified.as_deref().unwrap_or("-");
            let _ = writeln!(out, "{kind:<7} {size:>10}  {modified:<20}  {}", entry.name);
        }
        let _ = write!(out, "{} entries", entries.len());
        out
    }
}

impl ToolExecutor for ListDirectoryTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "list_directory",
            "List directory contents with metadata (type, size, modified time).",
            ArgumentSchema::new()
                .optional(
                    "path",
                    ArgKind::String,
                    "Directory to list (default: the workspace root)",
                )
                .optional("recursive", ArgKind::Boolean, "Descend into subdirectories")
                .optional(
                    "max_depth",
                    ArgKind::Integer,
                    "Maximum depth when recursive (default 3, max 10)",
                ),
        )
    }

    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let shim = Arc::clone(&self.shim);

        Box::pin(async move {
            let path = args.get("path").and_then(Value::as_str).unwrap_or(".");
            let recursive = args
                .get("recursive")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let max_depth = match args.get("max_depth").and_then(Value::as_i64) {
                Some(depth) if depth < 1 => {
                    return Err(ToolError::invalid_arguments(
                        "list_directory",
                        "max_depth must be at least 1",
                    ));
                }
                Some(depth) => usize::try_from(depth)
                    .unwrap_or(MAX_DEPTH_LIMIT)
                    .min(MAX_DEPTH_LIMIT),
                None => DEFAULT_MAX_DEPTH,
            };

            let entries = shim.list_directory(path, recursive, max_depth).await?;
            let text = Self::render(path, &entries);
            let cap = shim.config().max_output_bytes;
            let kept = &text.as_bytes()[..text.len().min(cap)];
            Ok(ToolOutput::text(render_capped(kept, text.len(), cap)))
        })
    }
}
