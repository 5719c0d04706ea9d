//! Search client seam and its HTTP implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::error::{HarnessError, HarnessResult};
use crate::outcome::Outcome;

/// Issues one search and classifies the result
///
/// Implementations never fail: every problem is folded into an [`Outcome`].
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Target description for reports and logs
    fn target(&self) -> &str;

    /// Send `payload` verbatim and classify the response
    async fn search(&self, payload: String) -> Outcome;
}

/// [`SearchClient`] posting JSON over HTTP with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    url: String,
}

impl HttpSearchClient {
    /// Build a client for `url`
    pub fn new(url: impl Into<String>, timeout: Duration) -> HarnessResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HarnessError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    fn target(&self) -> &str {
        &self.url
    }

    async fn search(&self, payload: String) -> Outcome {
        let response = match self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_error(&e),
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return classify_error(&e),
        };

        if !status.is_success() {
            tracing::debug!(
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&body[..body.len().min(256)]),
                "Search returned error status"
            );
            return Outcome::HttpError {
                status: status.as_u16(),
            };
        }

        if serde_json::from_slice::<serde::de::IgnoredAny>(&body).is_err() {
            tracing::warn!(status = status.as_u16(), "Search returned a non-JSON body");
            return Outcome::MalformedResponse;
        }

        Outcome::Success
    }
}

fn classify_error(e: &reqwest::Error) -> Outcome {
    if e.is_timeout() {
        tracing::debug!(error = %e, "Search timed out");
        Outcome::Timeout
    } else {
        tracing::warn!(error = %e, "Search request failed");
        Outcome::Transport
    }
}
