//! # HTTP Routes
//!
//! - `POST /postImage/{ignored}/{filename}`: raw image bytes in the body
//! - `GET  /health`: liveness check
//!
//! A completed pipeline answers `200` with the [`PipelineOutcome`] as JSON,
//! whether or not the labels matched. Failures answer with the status chosen
//! by [`PipelineError::status_code`] and a JSON [`ErrorResponse`].

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use uuid::Uuid;

use super::pipeline::{CheckerPipeline, PipelineOutcome};
use crate::common::error::PipelineError;
use crate::processing::UploadedImage;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

/// Build the service router around a shared pipeline.
pub fn router(pipeline: Arc<CheckerPipeline>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/postImage/:ignored/:filename", post(post_image_handler))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(pipeline)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "marmot-checker"
    }))
}

async fn post_image_handler(
    State(pipeline): State<Arc<CheckerPipeline>>,
    Path((_ignored, filename)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<PipelineOutcome>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = Uuid::new_v4();
    info!(
        "📤 [{}] Receiving POST for '{}' ({} bytes)",
        request_id,
        filename,
        body.len()
    );

    let outcome = match UploadedImage::new(&filename, body.to_vec()) {
        Ok(upload) => pipeline.process(request_id, upload).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            error!("❌ [{}] Pipeline failed for '{}': {}", request_id, filename, e);
            Err((e.status_code(), Json(ErrorResponse::from(&e))))
        }
    }
}
