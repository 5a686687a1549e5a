//! LaTeX/BibTeX invocation.
//!
//! BibTeX only formats entries that a LaTeX run asked for, so producing a
//! `.bbl` takes two steps:
//!
//! 1. The compiler reads a tiny driver document from stdin that cites every
//!    entry of the database. Reading from stdin makes LaTeX name its job
//!    `texput`, so it leaves `texput.aux` in the working directory.
//! 2. The formatter reads `texput.aux` and writes `texput.bbl`.
//!
//! Neither program's exit status is trusted: a missing program or a
//! non-zero exit is recorded in a [`ToolRun`] and only becomes an error in
//! strict mode. The stale `texput.bbl` from an earlier run is deleted first,
//! so a failed formatter shows up later as a missing artifact instead of as
//! silently reused output.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use thiserror::Error;

use crate::config::Config;

/// Job name LaTeX uses for a document read from stdin.
pub const JOB_NAME: &str = "texput";

/// Errors that can occur while running the toolchain.
#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("Working directory '{}' does not exist", .0.display())]
    WorkDir(PathBuf),

    #[error("Failed to remove stale artifact '{}': {source}", .path.display())]
    RemoveStale {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' {status}")]
    ToolFailed { program: String, status: ToolStatus },
}

/// How a toolchain program finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Succeeded,
    /// Exited unsuccessfully; `None` when killed by a signal
    Failed(Option<i32>),
    /// The program could not be found
    Missing,
}

impl ToolStatus {
    fn from_exit(status: ExitStatus) -> Self {
        if status.success() {
            ToolStatus::Succeeded
        } else {
            ToolStatus::Failed(status.code())
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolStatus::Succeeded)
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStatus::Succeeded => write!(f, "succeeded"),
            ToolStatus::Failed(Some(code)) => write!(f, "exited with status {}", code),
            ToolStatus::Failed(None) => write!(f, "was terminated by a signal"),
            ToolStatus::Missing => write!(f, "was not found"),
        }
    }
}

/// The outcome of running one toolchain program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    pub program: String,
    pub status: ToolStatus,
}

/// The outcome of a full toolchain run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainReport {
    pub compiler: ToolRun,
    pub formatter: ToolRun,
    /// Where the formatter was expected to write the bibliography
    pub artifact: PathBuf,
}

impl ToolchainReport {
    /// Runs that did not succeed, in execution order.
    pub fn failures(&self) -> impl Iterator<Item = &ToolRun> {
        [&self.compiler, &self.formatter]
            .into_iter()
            .filter(|run| !run.status.is_success())
    }
}

/// Builds the LaTeX driver that cites every entry of `database` and
/// formats them with `style`.
///
/// # Examples
///
/// ```
/// use doxybib::control_document;
///
/// let doc = control_document("ice_bib", "doxybib");
/// assert!(doc.contains(r"\bibliography{ice_bib}"));
/// assert!(doc.contains(r"\bibliographystyle{doxybib}"));
/// ```
pub fn control_document(database: &str, style: &str) -> String {
    format!(
        "\\documentclass{{article}}\n\
         \\begin{{document}}\n\
         \\cite{{*}}\\bibliography{{{}}}\\bibliographystyle{{{}}}\n\
         \\end{{document}}\n",
        database, style
    )
}

/// Deletes `path` if it exists.
pub fn remove_stale_artifact(path: &Path) -> Result<(), ToolchainError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ToolchainError::RemoveStale {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Runs the compiler on `document`, fed through stdin.
pub fn run_compiler(config: &Config, document: &str) -> Result<ToolRun, ToolchainError> {
    let mut command = tool_command(config, &config.compiler);
    command.stdin(Stdio::piped());

    let status = match spawn(&mut command, &config.compiler)? {
        Some(mut child) => {
            feed_stdin(&mut child, document, &config.compiler)?;
            let status = child.wait().map_err(|source| ToolchainError::Spawn {
                program: config.compiler.clone(),
                source,
            })?;
            ToolStatus::from_exit(status)
        }
        None => ToolStatus::Missing,
    };

    Ok(ToolRun {
        program: config.compiler.clone(),
        status,
    })
}

/// Runs the formatter on the `texput` job left behind by the compiler.
pub fn run_formatter(config: &Config) -> Result<ToolRun, ToolchainError> {
    let mut command = tool_command(config, &config.formatter);
    command.arg(JOB_NAME).stdin(Stdio::null());

    let status = match spawn(&mut command, &config.formatter)? {
        Some(mut child) => {
            let status = child.wait().map_err(|source| ToolchainError::Spawn {
                program: config.formatter.clone(),
                source,
            })?;
            ToolStatus::from_exit(status)
        }
        None => ToolStatus::Missing,
    };

    Ok(ToolRun {
        program: config.formatter.clone(),
        status,
    })
}

/// Removes the stale artifact, then runs the compiler and the formatter.
///
/// # Errors
///
/// Fails if the working directory is missing, the stale artifact cannot be
/// removed, or a program cannot be started for a reason other than not
/// existing. In strict mode, also fails on the first program that is missing
/// or exits unsuccessfully.
pub fn run(config: &Config) -> Result<ToolchainReport, ToolchainError> {
    if !config.work_dir.is_dir() {
        return Err(ToolchainError::WorkDir(config.work_dir.clone()));
    }

    let artifact = config.artifact_path();
    remove_stale_artifact(&artifact)?;

    let document = control_document(&config.database, &config.style);
    let compiler = check(config, run_compiler(config, &document)?)?;
    let formatter = check(config, run_formatter(config)?)?;

    Ok(ToolchainReport {
        compiler,
        formatter,
        artifact,
    })
}

fn check(config: &Config, run: ToolRun) -> Result<ToolRun, ToolchainError> {
    if config.strict && !run.status.is_success() {
        return Err(ToolchainError::ToolFailed {
            program: run.program,
            status: run.status,
        });
    }
    Ok(run)
}

fn tool_command(config: &Config, program: &str) -> Command {
    let mut command = Command::new(program);
    command.current_dir(&config.work_dir);
    if !config.verbose {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }
    command
}

/// Spawns `command`, mapping a missing program to `None`.
fn spawn(command: &mut Command, program: &str) -> Result<Option<Child>, ToolchainError> {
    match command.spawn() {
        Ok(child) => Ok(Some(child)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ToolchainError::Spawn {
            program: program.to_string(),
            source,
        }),
    }
}

fn feed_stdin(child: &mut Child, document: &str, program: &str) -> Result<(), ToolchainError> {
    // Dropping the handle closes the pipe so the compiler sees end of input
    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(document.as_bytes()) {
            Ok(()) => {}
            // The program exited without reading all of its input
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Err(source) => {
                return Err(ToolchainError::Spawn {
                    program: program.to_string(),
                    source,
                })
            }
        }
    }
    Ok(())
}
