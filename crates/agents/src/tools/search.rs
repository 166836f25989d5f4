use async_trait::async_trait;
use quorum_common::{QuorumError, Result};
use serde::{Deserialize, Serialize};

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search capability used by the researcher.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Client for the Tavily search API.
pub struct TavilySearch {
    api_key: String,
    max_results: usize,
    http_client: reqwest::Client,
}

impl TavilySearch {
    pub fn new(api_key: String, max_results: usize) -> Self {
        Self {
            api_key,
            max_results,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let body = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
        };

        let response = self
            .http_client
            .post(TAVILY_API_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| QuorumError::Search(format!("Tavily request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(QuorumError::Search(format!(
                "Tavily API error {status}: {body_text}"
            )));
        }

        let tavily: TavilyResponse = response
            .json()
            .await
            .map_err(|e| QuorumError::Search(format!("Failed to parse Tavily response: {e}")))?;

        Ok(tavily
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }
}
