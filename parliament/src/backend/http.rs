//! `reqwest` implementation of the backend contract.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use tracing::{debug, warn};

use super::wire;
use super::ParliamentBackend;
use crate::config::ParliamentConfig;
use crate::error::{ParliamentError, ParliamentResult};
use crate::model::{DebateTranscript, Paper, PaperId};

/// HTTP client for the parliament backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ParliamentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ParliamentError::config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &ParliamentConfig) -> ParliamentResult<Self> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and read the body of a successful response.
    async fn fetch(&self, request: RequestBuilder, what: &str) -> ParliamentResult<String> {
        let response = request.send().await.map_err(|e| {
            warn!(what, error = %e, "Backend request failed");
            ParliamentError::network(e.to_string())
        })?;
        let response = check_status(response, what).await?;
        response
            .text()
            .await
            .map_err(|e| ParliamentError::network(format!("reading {} body: {}", what, e)))
    }
}

async fn check_status(response: Response, what: &str) -> ParliamentResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(what, %status, "Backend returned an error status");
    Err(ParliamentError::network(format!(
        "{} request failed ({}): {}",
        what,
        status,
        body.chars().take(200).collect::<String>()
    )))
}

#[async_trait]
impl ParliamentBackend for HttpBackend {
    async fn import_papers(&self, source: &str, max_results: u32) -> ParliamentResult<Vec<Paper>> {
        let url = self.url(&format!("papers/{}/import", source));
        debug!(%url, max_results, "Importing papers");
        let request = self
            .client
            .post(&url)
            .query(&[("max_results", max_results)])
            .json(&Vec::<serde_json::Value>::new());
        let body = self.fetch(request, "paper import").await?;
        wire::decode_paper_list(&body, source)
    }

    async fn get_paper(&self, paper_id: &PaperId) -> ParliamentResult<Paper> {
        let url = self.url(&format!("papers/{}", paper_id));
        debug!(%url, "Fetching paper");
        let body = self.fetch(self.client.get(&url), "paper").await?;
        wire::decode_paper(&body)
    }

    async fn start_full_debate(&self, paper_id: &PaperId) -> ParliamentResult<DebateTranscript> {
        let url = self.url(&format!("debates/{}/start-full-debate", paper_id));
        debug!(%url, "Requesting full debate");
        let body = match self.fetch(self.client.post(&url), "debate").await {
            Ok(body) => body,
            Err(ParliamentError::Network { message }) => {
                return Err(ParliamentError::debate_generation(
                    paper_id.as_str(),
                    message,
                ))
            }
            Err(e) => return Err(e),
        };
        wire::decode_debate(&body, paper_id)
    }

    async fn health(&self) -> ParliamentResult<String> {
        let body = self.fetch(self.client.get(self.url("health")), "health").await?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ParliamentError::malformed("health", e.to_string()))?;
        Ok(value["status"].as_str().unwrap_or("unknown").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let backend = HttpBackend::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(
            backend.url("/papers/arxiv/import"),
            "http://localhost:8000/papers/arxiv/import"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = backend.import_papers("arxiv", 6).await.unwrap_err();
        assert_eq!(err.code(), "NETWORK");
    }

    #[tokio::test]
    async fn test_unreachable_debate_is_generation_error() {
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = backend
            .start_full_debate(&PaperId::new("3"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DEBATE_GENERATION");
    }
}
