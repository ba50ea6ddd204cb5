//! HTTP transport for API endpoints
//!
//! The [`Transport`] trait is the seam between the request orchestrator and
//! the network. [`HttpTransport`] implements it on top of `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::api::{Endpoint, Method};

/// Errors that can occur while fetching an endpoint
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failure or unreadable body
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },
}

/// Issues network calls for endpoints
///
/// Implementations perform a single attempt per call. Retries and timeouts
/// are not handled here.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches the endpoint and returns the response body as text
    async fn fetch(&self, endpoint: &Endpoint) -> Result<String, TransportError>;
}

/// Transport backed by a `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
    /// Replaces the endpoint's base address when set
    base_url: Option<String>,
}

impl HttpTransport {
    /// Creates a new HttpTransport with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends every request to `base_url` instead of the endpoint's own base address
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Resolves the request URL for an endpoint
    fn url_for(&self, endpoint: &Endpoint) -> String {
        match &self.base_url {
            Some(base) => format!("{}{}", base, endpoint.path),
            None => endpoint.url(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<String, TransportError> {
        let url = self.url_for(endpoint);
        tracing::debug!(method = endpoint.method.as_str(), %url, "sending request");

        let request = match endpoint.method {
            Method::Get => self.client.get(&url),
        };
        let response = request.send().await?;

        let status = response.status();
        if endpoint.requires_validation && !status.is_success() {
            return Err(TransportError::Status { status, url });
        }

        Ok(response.text().await?)
    }
}
