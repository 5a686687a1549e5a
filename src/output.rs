//! Writing the HTML fragment.
//!
//! The output is written in one piece, truncating any previous file. There
//! is no temporary-file rename, so an interrupted write can leave a partial
//! file behind.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::artifact::{load_artifact, ArtifactError};
use crate::rules::convert;

/// Errors that can occur when writing the output.
#[derive(Error, Debug)]
#[error("Failed to write '{}': {source}", .path.display())]
pub struct OutputError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Errors from a load-convert-write run.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Writes `text` to `path`, replacing whatever was there.
pub fn write_output(path: &Path, text: &str) -> Result<(), OutputError> {
    fs::write(path, text).map_err(|source| OutputError {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a `.bbl` artifact, converts it to HTML and writes the result.
///
/// # Returns
///
/// The number of bytes written.
pub fn convert_artifact(artifact: &Path, output: &Path) -> Result<usize, ConvertError> {
    let bbl = load_artifact(artifact)?;
    let html = convert(&bbl);
    write_output(output, &html)?;
    Ok(html.len())
}
