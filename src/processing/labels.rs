//! # Label Extraction
//!
//! Parses the classification reply into the ordered list of label descriptions
//! found at `responses[0].labelAnnotations[*].description`.
//!
//! The reply is deserialized into a fixed schema in one step, so any shape
//! mismatch surfaces as [`PipelineError::Parse`] instead of failing midway.
//! Fields outside the path (`mid`, `score`, `topicality`, ...) are ignored.

use serde::Deserialize;

use crate::common::error::PipelineError;

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
struct AnnotateImageResponse {
    #[serde(rename = "labelAnnotations")]
    label_annotations: Option<Vec<EntityAnnotation>>,
    error: Option<ServiceStatus>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    description: String,
}

/// Per-image error object the service reports in place of annotations.
#[derive(Debug, Deserialize)]
struct ServiceStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Extract label descriptions from a raw classification reply.
///
/// Every returned label is kept, even when the service sends more than were
/// requested. An empty `labelAnnotations` array yields an empty list.
///
/// # Errors
/// - [`PipelineError::Parse`] if the body is not JSON, `responses` is empty,
///   or `labelAnnotations` / a `description` is missing or mistyped
/// - [`PipelineError::Remote`] if the service reported a per-image error
pub fn extract_labels(body: &str) -> Result<Vec<String>, PipelineError> {
    let response: AnnotateResponse = serde_json::from_str(body)?;

    let first = response
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::Parse("'responses' is empty".to_string()))?;

    if let Some(status) = first.error {
        return Err(PipelineError::remote(
            "classification",
            format!("service error {}: {}", status.code, status.message),
        ));
    }

    let annotations = first
        .label_annotations
        .ok_or_else(|| PipelineError::Parse("'labelAnnotations' is missing".to_string()))?;

    Ok(annotations
        .into_iter()
        .map(|annotation| annotation.description)
        .collect())
}
