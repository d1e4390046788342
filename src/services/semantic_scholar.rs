//! Semantic Scholar Graph API client
//!
//! Thin client for the paper-search endpoint. Retry and pacing live in
//! the workflow layer; this client only classifies a single response.
//! Rate limiting (HTTP 429) is reported as its own error variant because
//! the retry policy treats it differently from other API failures.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Public Graph API base URL; overridable for tests and mirrors
pub const DEFAULT_BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";

const USER_AGENT: &str = "citesync/0.1.0 (https://github.com/citesync/citesync)";
const SEARCH_FIELDS: &str = "title,citationCount,url,authors";
const SEARCH_LIMIT: u32 = 10;

/// Semantic Scholar client errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Paper-search response body
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<PaperCandidate>,
}

/// One ranked search candidate. Every field is optional in the API;
/// candidates missing a title or count are useless for matching and get
/// filtered downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperCandidate {
    pub title: Option<String>,
    #[serde(rename = "citationCount")]
    pub citation_count: Option<u64>,
    pub url: Option<String>,
    pub authors: Option<Vec<CandidateAuthor>>,
}

/// Author entry attached to a candidate
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateAuthor {
    pub name: Option<String>,
}

/// Search seam for the lookup engine; tests substitute an in-process fake.
#[async_trait]
pub trait CitationSource: Send + Sync {
    /// Run one free-text search, returning the ranked candidate list
    /// (possibly empty).
    async fn search(&self, query: &str) -> Result<Vec<PaperCandidate>, SourceError>;
}

/// HTTP client for the Graph API
pub struct SemanticScholarClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SemanticScholarClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CitationSource for SemanticScholarClient {
    async fn search(&self, query: &str) -> Result<Vec<PaperCandidate>, SourceError> {
        let url = format!("{}/paper/search", self.base_url);
        let limit = SEARCH_LIMIT.to_string();

        tracing::debug!(query = %query, url = %url, "Querying Semantic Scholar paper search");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("fields", SEARCH_FIELDS),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 429 {
            return Err(SourceError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError(status.as_u16(), error_text));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(e.to_string()))?;

        tracing::debug!(query = %query, candidates = body.data.len(), "Search response received");

        Ok(body.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = SemanticScholarClient::new(DEFAULT_BASE_URL);
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = SemanticScholarClient::new("http://localhost:9000/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_candidate_with_all_fields() {
        let json = r#"{
            "title": "Attention Is All You Need",
            "citationCount": 100000,
            "url": "https://www.semanticscholar.org/paper/abc",
            "authors": [{"name": "Ashish Vaswani"}]
        }"#;
        let candidate: PaperCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.title.as_deref(), Some("Attention Is All You Need"));
        assert_eq!(candidate.citation_count, Some(100000));
        assert_eq!(candidate.authors.unwrap().len(), 1);
    }

    #[test]
    fn test_candidate_with_missing_fields() {
        let candidate: PaperCandidate = serde_json::from_str("{}").unwrap();
        assert!(candidate.title.is_none());
        assert!(candidate.citation_count.is_none());
        assert!(candidate.url.is_none());
        assert!(candidate.authors.is_none());
    }

    #[test]
    fn test_response_without_data_field() {
        let response: SearchResponse = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert!(response.data.is_empty());
    }
}
