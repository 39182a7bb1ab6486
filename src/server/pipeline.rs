//! # Checker Pipeline
//!
//! Runs one upload through every stage, strictly in order:
//!
//! ```text
//! Received -> Validated -> Encoded -> Classified -> Extracted -> Matched(yes|no) -> [Forwarded] -> Done
//! ```
//!
//! There are no retries. The first failing stage ends the invocation with its
//! [`PipelineError`]; the HTTP layer turns that into a response for this
//! request only.
//!
//! The temporary artifact is created first and held by the stages that need
//! it. It is removed when the last handle drops, so every exit path releases it.

use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::client::{Classifier, Forwarder, StorageForwarder, VisionClient};
use crate::common::config::CheckerConfig;
use crate::common::error::PipelineError;
use crate::processing::{
    check_match, encode_payload, extract_labels, AllowList, MatchResult, TempArtifact,
    UploadedImage, ValidatedImage,
};

/// Result of a pipeline run that reached `Done`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub request_id: Uuid,
    pub filename: String,
    /// `true` only when the image was matched and stored
    pub forwarded: bool,
    #[serde(flatten)]
    pub result: MatchResult,
}

/// The classification and matching pipeline.
///
/// Holds only read-only settings and the two remote collaborators, so one
/// instance is shared by every request.
pub struct CheckerPipeline {
    allow_list: AllowList,
    temp_dir: Option<PathBuf>,
    classifier: Arc<dyn Classifier>,
    forwarder: Arc<dyn Forwarder>,
}

impl CheckerPipeline {
    /// Assemble a pipeline around explicit collaborators.
    pub fn new(
        config: &CheckerConfig,
        classifier: Arc<dyn Classifier>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        Self {
            allow_list: config.allow_list.clone(),
            temp_dir: config.server.temp_dir.clone(),
            classifier,
            forwarder,
        }
    }

    /// Assemble a pipeline that talks to the configured HTTP services.
    pub fn from_config(config: &CheckerConfig) -> Result<Self, PipelineError> {
        let classifier = VisionClient::new(&config.classification)?;
        let forwarder = StorageForwarder::new(&config.storage)?;
        Ok(Self::new(config, Arc::new(classifier), Arc::new(forwarder)))
    }

    /// Run `upload` through the whole pipeline.
    ///
    /// # Returns
    /// - `Ok(PipelineOutcome)`: labels were checked; `forwarded` tells whether
    ///   the image was stored
    /// - `Err(PipelineError)`: the stage that failed, nothing after it ran
    pub async fn process(
        &self,
        request_id: Uuid,
        upload: UploadedImage,
    ) -> Result<PipelineOutcome, PipelineError> {
        let filename = upload.filename().to_string();
        info!(
            "📷 [{}] Processing '{}' ({} bytes)",
            request_id,
            filename,
            upload.size()
        );

        // Received -> Validated -> Encoded
        let temp_dir = self.temp_dir.clone();
        let (image, payload) = run_blocking(move || {
            let artifact = Arc::new(TempArtifact::persist(temp_dir.as_deref(), &upload)?);
            let image = ValidatedImage::check(artifact)?;
            let payload = encode_payload(&image.read_bytes()?)?;
            Ok((image, payload))
        })
        .await?;
        debug!("[{}] Validated PNG, payload is {} bytes", request_id, payload.len());

        // Classified -> Extracted
        let reply = self.classifier.classify(payload).await?;
        let labels = extract_labels(&reply)?;
        debug!("[{}] Labels: {:?}", request_id, labels);

        // Matched(yes|no)
        let result = check_match(labels, &self.allow_list);
        info!("🔎 [{}] {}", request_id, result.report());

        if !result.is_match() {
            return Ok(PipelineOutcome {
                request_id,
                filename,
                forwarded: false,
                result,
            });
        }

        // Forwarded
        let source = image.clone();
        let bytes = run_blocking(move || source.read_bytes()).await?;
        self.forwarder.forward(image.filename(), bytes).await?;

        info!("✅ [{}] '{}' forwarded to storage", request_id, filename);

        Ok(PipelineOutcome {
            request_id,
            filename,
            forwarded: true,
            result,
        })
    }
}

/// Run filesystem work on the blocking pool.
async fn run_blocking<T, F>(task: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|e| {
        PipelineError::Artifact(std::io::Error::other(format!("blocking task failed: {}", e)))
    })?
}
