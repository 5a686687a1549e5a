//! doxybib: render a BibTeX database as an HTML fragment.
//!
//! This library provides functionality to:
//! - Drive LaTeX and BibTeX to produce a formatted `.bbl` bibliography
//! - Load the generated `.bbl` artifact
//! - Rewrite the BibTeX markup into HTML with an ordered table of substitutions
//! - Write the resulting fragment for a documentation generator to include

pub mod artifact;
pub mod config;
pub mod output;
pub mod rules;
pub mod toolchain;

pub use artifact::{load_artifact, ArtifactError};
pub use config::{load_config, Config, ConfigError};
pub use output::{convert_artifact, write_output, ConvertError, OutputError};
pub use rules::{convert, CompiledRule, Pipeline, SubstitutionRule, RULES};
pub use toolchain::{control_document, ToolRun, ToolStatus, ToolchainError, ToolchainReport};
