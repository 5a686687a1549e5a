//! Run configuration.
//!
//! A [`Config`] names the bibliography database, the BibTeX style, the
//! output file and the toolchain programs. It can be loaded from a TOML
//! file; every key is optional and falls back to its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::toolchain::JOB_NAME;

/// Errors that can occur when loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// BibTeX database base name (without `.bib`), as passed to `\bibliography`
    pub database: String,
    /// BibTeX style base name (without `.bst`), as passed to `\bibliographystyle`
    pub style: String,
    /// Output file, relative to `work_dir` unless absolute
    pub output: PathBuf,
    /// Directory the toolchain runs in and where its auxiliary files land
    pub work_dir: PathBuf,
    /// LaTeX compiler program
    pub compiler: String,
    /// BibTeX program
    pub formatter: String,
    /// Treat a missing or failing toolchain program as an error
    pub strict: bool,
    /// Let toolchain programs print to the terminal
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "ice_bib".to_string(),
            style: "doxybib".to_string(),
            output: PathBuf::from("doxybib.txt"),
            work_dir: PathBuf::from("."),
            compiler: "latex".to_string(),
            formatter: "bibtex".to_string(),
            strict: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Where the output fragment is written.
    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(&self.output)
    }

    /// Where BibTeX leaves the formatted bibliography.
    pub fn artifact_path(&self) -> PathBuf {
        self.work_dir.join(format!("{}.bbl", JOB_NAME))
    }
}

/// Loads a configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or
/// contains keys that [`Config`] does not know about.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}
