//! # marmot-checker
//!
//! Accepts PNG uploads over HTTP, asks a label-detection service what they
//! show, and forwards the ones whose labels are on an allow-list to a
//! storage/indexing service.

pub mod client;
pub mod common;
pub mod processing;
pub mod server;

pub use common::{CheckerConfig, PipelineError};
pub use server::{CheckerPipeline, PipelineOutcome};
