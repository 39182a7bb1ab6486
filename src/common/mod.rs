//! # Common Components
//!
//! Shared pieces used by the pipeline, the remote clients and the HTTP layer.
//!
//! ## Modules
//!
//! - [`config`]: Settings loading (TOML file + environment) into [`CheckerConfig`]
//! - [`error`]: The tagged [`PipelineError`] every stage returns

pub mod config;
pub mod error;

pub use config::CheckerConfig;
pub use error::PipelineError;
