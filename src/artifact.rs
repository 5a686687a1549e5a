//! Loading of the `.bbl` artifact written by BibTeX.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading the artifact.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read file: {0}")]
    IoError(#[from] io::Error),

    #[error("Artifact is not valid UTF-8: {}", .0.display())]
    NotUtf8(PathBuf),
}

/// Loads the whole artifact as one string.
///
/// Line terminators are kept exactly as BibTeX wrote them; the substitution
/// rules depend on seeing `%` followed by a newline.
///
/// # Errors
///
/// Returns [`ArtifactError::NotFound`] if nothing exists at `path`, which is
/// what happens when BibTeX failed to run after a stale artifact was removed.
pub fn load_artifact(path: &Path) -> Result<String, ArtifactError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArtifactError::NotFound(path.to_path_buf()),
        _ => ArtifactError::IoError(e),
    })?;

    String::from_utf8(bytes).map_err(|_| ArtifactError::NotUtf8(path.to_path_buf()))
}
