//! Tavily search API provider.

use super::{search_failed, SearchHit, SearchProvider};
use crate::tools::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tavily API endpoint.
const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Tavily AI-optimized search provider.
#[derive(Clone)]
pub struct Tavily {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl std::fmt::Debug for Tavily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tavily")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Tavily {
    /// Creates a provider using the public Tavily endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: TAVILY_API_URL.to_string(),
        }
    }

    /// Overrides the endpoint URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for Tavily {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ToolError> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth: "basic",
            include_answer: false,
            max_results: limit,
        };

        let response: TavilyResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| search_failed("Tavily", &e))?
            .json()
            .await
            .map_err(|e| search_failed("Tavily", &e))?;

        Ok(response
            .results
            .into_iter()
            .take(limit)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    include_answer: bool,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let provider = Tavily::new(reqwest::Client::new(), "tvly-secret");
        let debug = format!("{provider:?}");
        assert!(!debug.contains("tvly-secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn request_serializes_expected_fields() {
        let request = TavilyRequest {
            api_key: "k",
            query: "q",
            search_depth: "basic",
            include_answer: false,
            max_results: 3,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_results"], 3);
        assert_eq!(json["search_depth"], "basic");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_execution_failure() {
        let provider = Tavily::new(reqwest::Client::new(), "k")
            .with_endpoint("http://127.0.0.1:9/search");
        let error = provider.search("q", 1).await.unwrap_err();
        assert_eq!(error.code(), crate::tools::ToolErrorCode::ExecutionFailed);
    }
}
