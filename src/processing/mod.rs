//! # Image Processing
//!
//! The local, side-effect-free steps of the checker pipeline plus the scoped
//! temporary file that brackets it:
//!
//! - [`artifact`]: Per-request temporary file, removed on drop
//! - [`format`]: PNG sniffing on the first 512 bytes
//! - [`payload`]: Base64 classification request body
//! - [`labels`]: Label extraction from the classification reply
//! - [`matcher`]: Allow-list match decision and report

pub mod artifact;
pub mod format;
pub mod labels;
pub mod matcher;
pub mod payload;

// Re-export main types for convenience
pub use artifact::{TempArtifact, UploadedImage};
pub use format::ValidatedImage;
pub use labels::extract_labels;
pub use matcher::{check_match, AllowList, MatchResult};
pub use payload::{encode_payload, ClassificationRequest, MAX_RESULTS};
