//! HTTP transport used by the probe engine.
//!
//! The engine only needs "GET this URL, tell me the status", so the transport
//! is a small trait. `HttpTransport` is the reqwest-backed implementation;
//! tests and embedders can supply their own.

use crate::error::ProbeError;
use crate::types::{ProbeConfig, ProbeResponse};
use async_trait::async_trait;
use std::time::Duration;

/// Issues a single GET request and reports the response status.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get(&self, url: &str) -> Result<ProbeResponse, ProbeError>;
}

/// reqwest-backed transport sharing one connection pool across all probes.
#[derive(Clone)]
pub struct HttpTransport {
    /// HTTP client for making probe requests
    http_client: reqwest::Client,
    /// Timeout applied to connect and to the whole request
    timeout: Duration,
}

impl HttpTransport {
    /// Create a new transport with default settings.
    pub fn new() -> Result<Self, ProbeError> {
        Self::with_config(&ProbeConfig::default())
    }

    /// Create a new transport from an engine configuration.
    pub fn with_config(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                ProbeError::config(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            timeout: config.timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<ProbeResponse, ProbeError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, self.timeout, e))?;

        // Only the status matters; the body is dropped unread.
        Ok(ProbeResponse::new(response.status().as_u16()))
    }
}

fn classify_error(url: &str, timeout: Duration, err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        ProbeError::timeout(url, timeout)
    } else if err.is_connect() {
        ProbeError::network(url, format!("Connection failed: {}", err))
    } else if err.is_redirect() {
        ProbeError::network(url, format!("Too many redirects: {}", err))
    } else {
        ProbeError::network(url, format!("Request failed: {}", err))
    }
}
