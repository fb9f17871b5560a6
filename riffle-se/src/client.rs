//! HTTP client for the sample server protocol
//!
//! The engine consumes the server through the [`SampleSource`] trait so the
//! tests can script responses; [`HttpSampleSource`] is the production
//! implementation.

use crate::error::{Error, Result};
use async_trait::async_trait;
use riffle_common::api::{ArchiveRequest, ArchiveResponse, AuthStatusResponse, SampleResponse};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("riffle-se/", env!("CARGO_PKG_VERSION"));

/// One selected sample as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleDescriptor {
    /// Transport-safe name used in the delivery URL
    pub display_name: String,
    /// On-disk name, shown to the user
    pub storage_name: String,
}

impl From<SampleResponse> for SampleDescriptor {
    fn from(resp: SampleResponse) -> Self {
        Self {
            display_name: resp.file,
            storage_name: resp.original_file,
        }
    }
}

/// Server operations the session engine depends on
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Whether the server accepts this client's credential
    async fn auth_status(&self) -> Result<bool>;

    /// Select the next random sample
    async fn next_sample(&self) -> Result<SampleDescriptor>;

    /// Fetch one sample's bytes by display name
    async fn fetch(&self, display_name: &str) -> Result<Vec<u8>>;

    /// Archive one sample by display name; returns the server's message
    async fn archive(&self, display_name: &str) -> Result<String>;
}

/// reqwest-backed client for the riffle-sv HTTP surface
pub struct HttpSampleSource {
    http_client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpSampleSource {
    pub fn new(base_url: impl Into<String>, bearer_token: Option<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http_client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Map a non-success response into `Error::Server`, extracting the
    /// server's error envelope when there is one.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<riffle_common::api::ErrorResponse>().await {
            Ok(envelope) => envelope.error,
            Err(_) => status.to_string(),
        };

        Err(Error::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl SampleSource for HttpSampleSource {
    async fn auth_status(&self) -> Result<bool> {
        let response = self
            .request(reqwest::Method::GET, "/auth/status")
            .send()
            .await?;
        let status: AuthStatusResponse = Self::check_status(response).await?.json().await?;
        Ok(status.is_authenticated)
    }

    async fn next_sample(&self) -> Result<SampleDescriptor> {
        let response = self
            .request(reqwest::Method::GET, "/api/sample")
            .send()
            .await?;
        let sample: SampleResponse = Self::check_status(response).await?.json().await?;

        debug!(sample = %sample.original_file, "Received next sample");
        Ok(sample.into())
    }

    async fn fetch(&self, display_name: &str) -> Result<Vec<u8>> {
        let response = self
            .request(reqwest::Method::GET, &format!("/api/sample/{display_name}"))
            .send()
            .await?;
        let bytes = Self::check_status(response).await?.bytes().await?;

        debug!(file = %display_name, size = bytes.len(), "Fetched sample bytes");
        Ok(bytes.to_vec())
    }

    async fn archive(&self, display_name: &str) -> Result<String> {
        let response = self
            .request(reqwest::Method::POST, "/api/add-to-drive")
            .json(&ArchiveRequest {
                file_name: display_name.to_string(),
            })
            .send()
            .await?;
        let reply: ArchiveResponse = Self::check_status(response).await?.json().await?;
        Ok(reply.message)
    }
}
