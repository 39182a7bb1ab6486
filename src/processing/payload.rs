//! # Classification Payload
//!
//! Builds the JSON body for the label-detection request:
//!
//! ```text
//! {"requests":[{"image":{"content":"<b64>"},"features":[{"type":"LABEL_DETECTION","maxResults":3}]}]}
//! ```
//!
//! The image travels inline as standard (padded) base64.

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;

use crate::common::error::PipelineError;

/// Number of labels requested per image.
///
/// The extractor does not rely on this value: the service can return one more.
pub const MAX_RESULTS: u32 = 3;

const LABEL_DETECTION: &str = "LABEL_DETECTION";

/// Request body for the annotate endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Clone, Serialize)]
struct AnnotateImageRequest {
    image: InlineImage,
    features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize)]
struct InlineImage {
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "maxResults")]
    max_results: u32,
}

impl ClassificationRequest {
    /// Wrap already-encoded base64 content.
    pub fn from_base64(content: String) -> Self {
        Self {
            requests: vec![AnnotateImageRequest {
                image: InlineImage { content },
                features: vec![Feature {
                    kind: LABEL_DETECTION,
                    max_results: MAX_RESULTS,
                }],
            }],
        }
    }

    /// Base64-encode `image` and wrap it.
    pub fn for_image(image: &[u8]) -> Self {
        Self::from_base64(general_purpose::STANDARD.encode(image))
    }

    /// Serialize into the opaque body sent over the wire.
    pub fn to_body(&self) -> Result<Vec<u8>, PipelineError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Encode `image` straight into a request body.
pub fn encode_payload(image: &[u8]) -> Result<Vec<u8>, PipelineError> {
    ClassificationRequest::for_image(image).to_body()
}
