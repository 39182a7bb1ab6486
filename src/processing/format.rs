//! # Format Validator
//!
//! Only PNG uploads are sent for classification. The check sniffs the first
//! [`SNIFF_LEN`] bytes of the artifact; the file extension and any declared
//! content type are ignored.

use std::io::Read;
use std::sync::Arc;

use image::ImageFormat;

use super::artifact::TempArtifact;
use crate::common::error::PipelineError;

/// Number of leading bytes inspected when sniffing the content type.
pub const SNIFF_LEN: usize = 512;

/// Returns `true` when `head` sniffs as `image/png`.
///
/// Any other recognised image format, or unrecognised bytes, is `false`.
pub fn sniff_png(head: &[u8]) -> bool {
    matches!(image::guess_format(head), Ok(ImageFormat::Png))
}

/// Read up to [`SNIFF_LEN`] bytes from `reader` and sniff them.
pub fn is_png<R: Read>(reader: R) -> std::io::Result<bool> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    reader.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    Ok(sniff_png(&head))
}

/// An artifact whose content has been confirmed to be PNG.
///
/// Only [`ValidatedImage::check`] constructs this type.
/// The artifact is shared so blocking reads can move a handle onto the
/// blocking pool; the file is removed when the last handle drops.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    artifact: Arc<TempArtifact>,
}

impl ValidatedImage {
    /// Sniff `artifact` and accept it only if it is a PNG.
    ///
    /// # Errors
    /// - [`PipelineError::Artifact`] if the file cannot be opened or read
    /// - [`PipelineError::Input`] if the content is not PNG
    pub fn check(artifact: Arc<TempArtifact>) -> Result<Self, PipelineError> {
        if !is_png(artifact.open()?)? {
            return Err(PipelineError::Input(format!(
                "image must be of format .png ('{}' is not)",
                artifact.filename()
            )));
        }
        Ok(Self { artifact })
    }

    pub fn filename(&self) -> &str {
        self.artifact.filename()
    }

    /// Read the full image bytes from the artifact.
    pub fn read_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        self.artifact.read_all()
    }
}
