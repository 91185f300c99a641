//! Web search built-in tool.

use crate::search::{render_hits, SearchProvider};
use crate::tools::schema::{ArgKind, ArgumentSchema};
use crate::tools::{ToolError, ToolExecutionFuture, ToolExecutor, ToolOutput, ToolSpec};
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 10;

/// Queries the configured search provider.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    /// Creates the tool over a shared provider.
    #[must_use]
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

impl ToolExecutor for WebSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "web_search",
            "Search the web and return titles, URLs and snippets of the top results.",
            ArgumentSchema::new()
                .required("query", ArgKind::String, "The search query")
                .optional(
                    "limit",
                    ArgKind::Integer,
                    "Number of results (default 5, max 10)",
                ),
        )
    }

    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let provider = Arc::clone(&self.provider);

        Box::pin(async move {
            let query = args["query"].as_str().unwrap_or_default().trim().to_string();
            if query.is_empty() {
                return Err(ToolError::invalid_arguments("web_search", "query cannot be empty"));
            }
            let limit = args
                .get("limit")
                .and_then(Value::as_i64)
                .map_or(DEFAULT_LIMIT, |n| {
                    usize::try_from(n).unwrap_or(1).clamp(1, MAX_LIMIT)
                });

            let hits = provider.search(&query, limit).await?;
            tracing::debug!(provider = provider.name(), hits = hits.len(), "Web search finished");
            Ok(ToolOutput::text(render_hits(&query, &hits)))
        })
    }
}
