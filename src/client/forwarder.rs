//! # Storage Forwarder
//!
//! Uploads matched images to the storage/indexing service at
//! `<base>/postfile/<filename>`. The reply body is ignored; only the status
//! matters.

use async_trait::async_trait;
use log::info;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use crate::common::config::StorageSettings;
use crate::common::error::PipelineError;

const SERVICE: &str = "storage";

/// Destination for images that passed the allow-list check.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Store `image` under `filename`.
    async fn forward(&self, filename: &str, image: Vec<u8>) -> Result<(), PipelineError>;
}

/// HTTP forwarder for the storage/indexing service.
pub struct StorageForwarder {
    http: reqwest::Client,
    base_url: Url,
}

impl StorageForwarder {
    pub fn new(settings: &StorageSettings) -> Result<Self, PipelineError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self::with_client(http, settings))
    }

    pub fn with_client(http: reqwest::Client, settings: &StorageSettings) -> Self {
        Self {
            http,
            base_url: settings.base_url.clone(),
        }
    }

    /// `<base>/postfile/<filename>`, with the filename escaped as one segment.
    pub fn file_url(&self, filename: &str) -> Result<Url, PipelineError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                PipelineError::Config(format!("storage URL {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .push("postfile")
            .push(filename);
        Ok(url)
    }
}

#[async_trait]
impl Forwarder for StorageForwarder {
    async fn forward(&self, filename: &str, image: Vec<u8>) -> Result<(), PipelineError> {
        let url = self.file_url(filename)?;
        let size = image.len();

        let response = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(|e| PipelineError::remote(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::remote(
                SERVICE,
                format!("status {} from {}", status, url),
            ));
        }

        info!("📦 Forwarded '{}' ({} bytes) to {}", filename, size, url);
        Ok(())
    }
}
