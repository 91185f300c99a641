//! Built-in tools.
//!
//! ## Available Tools
//!
//! ### Filesystem Tools
//! - **read_file**: Read file contents
//! - **write_file**: Write or append to files
//! - **list_directory**: List directory contents with metadata
//!
//! ### Execution Tools
//! - **run_shell**: Execute shell commands (including `docker`)
//!
//! ### Web Tools
//! - **web_search**: Query the configured search provider
//!
//! Every tool is a thin adapter over the [`ExecutionShim`] or a
//! [`SearchProvider`].

mod list_directory;
mod read_file;
mod run_shell;
mod web_search;
mod write_file;

pub use list_directory::ListDirectoryTool;
pub use read_file::ReadFileTool;
pub use run_shell::RunShellTool;
pub use web_search::WebSearchTool;
pub use write_file::WriteFileTool;

use crate::search::SearchProvider;
use crate::shim::ExecutionShim;
use crate::tools::ToolRegistry;
use std::sync::Arc;

/// Names of all built-in tools.
pub const BUILTIN_TOOL_NAMES: &[&str] = &[
    "list_directory",
    "read_file",
    "run_shell",
    "web_search",
    "write_file",
];

/// Builds a registry holding every built-in tool.
#[must_use]
pub fn builtin_registry(
    shim: Arc<ExecutionShim>,
    search: Arc<dyn SearchProvider>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(RunShellTool::new(Arc::clone(&shim))));
    registry.register(Arc::new(ReadFileTool::new(Arc::clone(&shim))));
    registry.register(Arc::new(WriteFileTool::new(Arc::clone(&shim))));
    registry.register(Arc::new(ListDirectoryTool::new(shim)));
    registry.register(Arc::new(WebSearchTool::new(search)));
    tracing::debug!(tools = registry.len(), "Built-in tools registered");
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearXNG;
    use crate::shim::ShimConfig;

    #[test]
    fn builtin_registry_lists_all_tools() {
        let shim = Arc::new(ExecutionShim::new(ShimConfig::default()));
        let search = Arc::new(SearXNG::new(reqwest::Client::new(), "http://localhost:8080"));
        let registry = builtin_registry(shim, search);

        let names: Vec<_> = registry.list().iter().map(|spec| spec.name).collect();
        assert_eq!(names, BUILTIN_TOOL_NAMES);
    }
}
