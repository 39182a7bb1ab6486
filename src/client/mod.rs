//! # Remote Collaborators
//!
//! Outbound HTTP clients used by the pipeline. Each sits behind a trait so the
//! pipeline can run against in-process fakes:
//!
//! ## Classification ([`classification`])
//! Posts the base64 payload to the label-detection API and returns the raw reply.
//!
//! ## Forwarding ([`forwarder`])
//! Uploads matched images to the storage/indexing service, keyed by filename.

pub mod classification;
pub mod forwarder;

// Re-export for convenience
pub use classification::{Classifier, VisionClient};
pub use forwarder::{Forwarder, StorageForwarder};
