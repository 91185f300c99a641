//! Web search providers.
//!
//! | Provider | API Key | Description |
//! |----------|---------|-------------|
//! | [`SearXNG`] | Not required | **Default**; self-hosted metasearch engine |
//! | [`Tavily`] | Required | AI-optimized search API |

mod searxng;
mod tavily;

pub use searxng::SearXNG;
pub use tavily::Tavily;

use crate::tools::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A backend that answers web search queries.
#[async_trait]
pub trait SearchProvider: Send + Sync + Debug {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Returns at most `limit` hits for `query`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ToolError>;
}

/// Builds the HTTP client shared by the providers.
///
/// # Errors
///
/// Returns the reqwest error if the TLS backend cannot be initialized.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("dind-agent/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Maps a transport or decoding failure onto a tool error.
pub(crate) fn search_failed(provider: &str, error: &reqwest::Error) -> ToolError {
    let reason = if error.is_timeout() {
        format!("{provider} request timed out")
    } else if let Some(status) = error.status() {
        format!("{provider} returned HTTP {status}")
    } else if error.is_decode() {
        format!("{provider} returned an unexpected response: {error}")
    } else {
        format!("{provider} request failed: {error}")
    };
    ToolError::execution_failed("web_search", reason)
}

/// Renders hits as a numbered Markdown list.
#[must_use]
pub fn render_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results for \"{query}\".");
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. {}\n   {}\n   {}",
                i + 1,
                hit.title,
                hit.url,
                hit.snippet.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
