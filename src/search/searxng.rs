//! SearXNG metasearch engine provider.
//!
//! Requires an instance with the JSON output format enabled in its settings.

use super::{search_failed, SearchHit, SearchProvider};
use crate::tools::ToolError;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use url::Url;

/// SearXNG metasearch engine provider.
#[derive(Debug, Clone)]
pub struct SearXNG {
    client: reqwest::Client,
    base_url: String,
    engines: Option<String>,
}

impl SearXNG {
    /// Creates a provider for the instance at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            engines: None,
        }
    }

    /// Restricts the engines used (comma-separated).
    #[must_use]
    pub fn with_engines(mut self, engines: impl Into<String>) -> Self {
        self.engines = Some(engines.into());
        self
    }

    fn search_url(&self, query: &str) -> Result<Url, ToolError> {
        let mut url = Url::parse(&format!("{}/search", self.base_url)).map_err(|e| {
            ToolError::execution_failed(
                "web_search",
                format!("invalid SearXNG base URL '{}': {e}", self.base_url),
            )
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query).append_pair("format", "json");
            if let Some(ref engines) = self.engines {
                pairs.append_pair("engines", engines);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl SearchProvider for SearXNG {
    fn name(&self) -> &'static str {
        "searxng"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ToolError> {
        let url = self.search_url(query)?;

        let response: SearxngResponse = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| search_failed("SearXNG", &e))?
            .json()
            .await
            .map_err(|e| search_failed("SearXNG", &e))?;

        Ok(response
            .results
            .into_iter()
            .take(limit)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.content.unwrap_or_default(),
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    results: Vec<SearxngResult>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    title: String,
    url: String,
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_query() {
        let provider = SearXNG::new(reqwest::Client::new(), "http://localhost:8080/")
            .with_engines("duckduckgo,bing");
        let url = provider.search_url("docker in docker & rust").unwrap();
        assert_eq!(url.path(), "/search");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "docker in docker & rust".to_string()),
                ("format".to_string(), "json".to_string()),
                ("engines".to_string(), "duckduckgo,bing".to_string()),
            ]
        );
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let provider = SearXNG::new(reqwest::Client::new(), "not a url");
        let error = provider.search_url("q").unwrap_err();
        assert!(error.to_string().contains("invalid SearXNG base URL"));
    }

    #[test]
    fn response_parses_missing_content() {
        let body = r#"{"results":[{"title":"T","url":"https://x","content":null},{"title":"U","url":"https://y"}]}"#;
        let parsed: SearxngResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert!(parsed.results[1].content.is_none());
    }
}
