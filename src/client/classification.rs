//! # Classification Client
//!
//! Sends the encoded payload to the remote label-detection API and hands back
//! the raw reply body. Parsing is left to
//! [`extract_labels`](crate::processing::labels::extract_labels).
//!
//! The request goes to `<endpoint>?key=<API_KEY>` as `application/json`.
//! Transport failures and non-success statuses become
//! [`PipelineError::Remote`]; nothing is retried.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use crate::common::config::ClassificationSettings;
use crate::common::error::PipelineError;

const SERVICE: &str = "classification";

/// Longest slice of an error reply quoted back in the error message.
const ERROR_BODY_PREVIEW: usize = 256;

/// Anything that can turn a request body into a raw classification reply.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Submit `payload` and return the unparsed reply body.
    async fn classify(&self, payload: Vec<u8>) -> Result<String, PipelineError>;
}

/// HTTP client for the label-detection API.
pub struct VisionClient {
    http: reqwest::Client,
    /// Endpoint with the `key` query parameter already applied
    url: Url,
}

impl VisionClient {
    /// Build a client with the configured timeout.
    pub fn new(settings: &ClassificationSettings) -> Result<Self, PipelineError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self::with_client(http, settings))
    }

    /// Build around an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, settings: &ClassificationSettings) -> Self {
        let mut url = settings.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &settings.api_key);
        Self { http, url }
    }

    pub(crate) fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Classifier for VisionClient {
    async fn classify(&self, payload: Vec<u8>) -> Result<String, PipelineError> {
        debug!(
            "☁️  Posting {} byte payload to {}{}",
            payload.len(),
            self.url.host_str().unwrap_or("?"),
            self.url.path()
        );

        // `without_url` keeps the API key out of error messages.
        let response = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| PipelineError::remote(SERVICE, e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::remote(SERVICE, e.without_url().to_string()))?;

        if !status.is_success() {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(PipelineError::remote(
                SERVICE,
                format!("status {}: {}", status, preview),
            ));
        }

        info!("☁️  Classification reply received ({} bytes)", body.len());
        Ok(body)
    }
}
