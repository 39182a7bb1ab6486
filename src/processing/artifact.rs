//! # Temporary Artifact Store
//!
//! Each pipeline invocation writes its upload to its own uniquely named
//! temporary file. The file lives exactly as long as the [`TempArtifact`]
//! handle: dropping the handle deletes it, so every exit path of the pipeline
//! (success, rejected upload, remote failure) releases it.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use crate::common::error::PipelineError;

/// Raw upload as received from the HTTP caller.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    filename: String,
    bytes: Vec<u8>,
}

impl UploadedImage {
    /// Build an upload, keeping only the final path component of `filename`.
    ///
    /// # Errors
    /// - [`PipelineError::Input`] when no usable filename remains
    pub fn new(filename: &str, bytes: Vec<u8>) -> Result<Self, PipelineError> {
        let name = filename
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default();

        if name.is_empty() || name == "." || name == ".." {
            return Err(PipelineError::Input(format!(
                "'{}' is not a usable filename",
                filename
            )));
        }

        Ok(Self {
            filename: name.to_string(),
            bytes,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Upload size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// An upload persisted to a scoped temporary file.
#[derive(Debug)]
pub struct TempArtifact {
    file: NamedTempFile,
    filename: String,
}

impl TempArtifact {
    /// Persist `upload` into a fresh temporary file.
    ///
    /// # Arguments
    /// - `dir`: Directory to create the file in (system temp dir when `None`)
    /// - `upload`: The uploaded image
    pub fn persist(dir: Option<&Path>, upload: &UploadedImage) -> Result<Self, PipelineError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("marmot-").suffix(".upload");

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(upload.bytes())?;
        file.flush()?;

        debug!(
            "📝 Wrote {} bytes for '{}' to {}",
            upload.size(),
            upload.filename(),
            file.path().display()
        );

        Ok(Self {
            file,
            filename: upload.filename().to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Declared filename of the upload (not the temporary file's name).
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Open a fresh read handle positioned at the start of the artifact.
    pub fn open(&self) -> Result<File, PipelineError> {
        Ok(File::open(self.path())?)
    }

    /// Read the whole artifact back into memory.
    pub fn read_all(&self) -> Result<Vec<u8>, PipelineError> {
        let mut bytes = Vec::new();
        self.open()?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
