//! HTTP client for the CryptoSentinel service API

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::types::{
    AnalysisPayload, AnalyzeRequest, DecisionReply, FollowupReply, FollowupRequest, ResetRequest,
    TradingDecisionRequest,
};

use super::SentinelService;

/// Response from GET /api/health
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// HTTP client for the CryptoSentinel API.
///
/// Owns a current-thread tokio runtime and blocks on each request, so callers
/// stay synchronous.
pub struct HttpSentinelClient {
    http_client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    base_url: String,
}

impl HttpSentinelClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Service(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            http_client,
            runtime,
            base_url: config.normalized_base_url(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// POST a JSON body and decode a JSON reply
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "POST");

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Service(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            response
                .json::<R>()
                .await
                .map_err(|e| Error::Service(format!("failed to parse response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Service(format!(
                "API error ({}): {}",
                status,
                extract_detail(&error_text)
            )))
        }
    }
}

impl SentinelService for HttpSentinelClient {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisPayload> {
        self.runtime.block_on(self.post_json("analyze", request))
    }

    fn trading_decision(&self, request: &TradingDecisionRequest) -> Result<DecisionReply> {
        self.runtime
            .block_on(self.post_json("trading-decision", request))
    }

    fn reset(&self, request: &ResetRequest) -> Result<DecisionReply> {
        self.runtime.block_on(self.post_json("reset", request))
    }

    fn followup(&self, request: &FollowupRequest) -> Result<FollowupReply> {
        self.runtime.block_on(self.post_json("followup", request))
    }

    fn health_check(&self) -> Result<bool> {
        let url = self.endpoint("health");

        self.runtime.block_on(async {
            match self.http_client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.json::<HealthResponse>().await {
                        Ok(health) => Ok(health.status == "healthy"),
                        Err(_) => Ok(false),
                    }
                }
                Ok(_) | Err(_) => Ok(false),
            }
        })
    }
}

/// Pull `detail` out of a FastAPI-style error body, falling back to the raw text.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
