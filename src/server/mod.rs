//! # Checker Service
//!
//! - [`pipeline`]: The classification and matching pipeline for one upload
//! - [`routes`]: The axum router that feeds uploads into it

pub mod pipeline;
pub mod routes;

pub use pipeline::{CheckerPipeline, PipelineOutcome};
pub use routes::router;
