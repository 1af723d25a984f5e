//! HTTP client for the keigo analysis endpoint.

use crate::error::AnalysisError;
use crate::protocol::{AnalysisRequest, AnalysisResponse, Envelope};
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use std::error::Error as StdError;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Sends text to the analysis API and keeps the last successful raw body.
///
/// Cloning is cheap; clones share the connection pool and the raw slot.
#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    last_raw: Arc<RwLock<Option<String>>>,
}

impl AnalysisClient {
    /// Create a new client. No request timeout is applied.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("keigo-analyzer/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            last_raw: Arc::new(RwLock::new(None)),
        })
    }

    /// Body of the most recent successful reply, if there has been one.
    pub fn last_raw_response(&self) -> Option<String> {
        self.last_raw
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Submit `text` for analysis.
    ///
    /// The endpoint is checked before the text, and neither check touches
    /// the network.
    pub async fn analyze(
        &self,
        text: &str,
        endpoint: Option<&str>,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let url = parse_endpoint(endpoint)?;
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        info!(endpoint = %url, chars = text.chars().count(), "Submitting text for analysis");

        let request = AnalysisRequest {
            answer: text.to_string(),
        };

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if status != StatusCode::OK {
            warn!("Analysis request failed with status {}", status);
            return Err(AnalysisError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let analysis = parse_body(&body)?;
        debug!("Analysis decoded ({} bytes)", body.len());

        *self
            .last_raw
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(body);

        Ok(analysis)
    }
}

/// Validate the configured endpoint.
fn parse_endpoint(endpoint: Option<&str>) -> Result<Url, AnalysisError> {
    let raw = endpoint
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AnalysisError::InvalidEndpoint)?;

    let url = Url::parse(raw).map_err(|_| AnalysisError::InvalidEndpoint)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(AnalysisError::InvalidEndpoint),
    }
}

/// Decode a 200 body: outer envelope first, then the nested document.
fn parse_body(body: &str) -> Result<AnalysisResponse, AnalysisError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| {
        warn!("Response body is not a valid envelope: {}", e);
        AnalysisError::MalformedResponse
    })?;

    AnalysisResponse::from_payload(envelope.payload()).map_err(|e| {
        warn!("Nested analysis document did not decode: {}", e);
        AnalysisError::MalformedResponse
    })
}

/// Flatten a transport error and its sources into one message.
fn network_error(err: reqwest::Error) -> AnalysisError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    warn!("Analysis request failed: {}", message);
    AnalysisError::NetworkError { message }
}
