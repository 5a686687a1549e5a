//! CLI for doxybib - Render a BibTeX database as an HTML fragment.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use doxybib::{
    convert, load_artifact, load_config, toolchain, write_output, ArtifactError, Config,
    ToolchainError, RULES,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Render a BibTeX database as an HTML fragment
#[derive(Parser)]
#[command(name = "doxybib")]
#[command(version)]
#[command(after_help = "\
Without a subcommand, runs 'build' with the default settings.

Examples:
  doxybib
  doxybib build --database refs --output bib.html
  doxybib convert texput.bbl -o bib.html
  doxybib rules --json")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run LaTeX and BibTeX on a database and convert the result
    #[command(after_help = "\
Examples:
  doxybib build
  doxybib build --config doxybib.toml
  doxybib build -d refs -s doxybib -o refs.txt --strict

Runs '<compiler>' on a driver document citing every entry, then
'<formatter> texput', and converts texput.bbl.")]
    Build(BuildArgs),

    /// Convert an existing .bbl file without running the toolchain
    Convert {
        /// Input .bbl file (use '-' for stdin)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the substitution rules in the order they are applied
    Rules {
        /// Print the rules as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Default)]
struct BuildArgs {
    /// TOML file with default settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// BibTeX database base name (without .bib)
    #[arg(short, long)]
    database: Option<String>,

    /// BibTeX style base name (without .bst)
    #[arg(short, long)]
    style: Option<String>,

    /// Output file, relative to --dir
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Working directory for the toolchain
    #[arg(long)]
    dir: Option<PathBuf>,

    /// LaTeX program
    #[arg(long)]
    compiler: Option<String>,

    /// BibTeX program
    #[arg(long)]
    formatter: Option<String>,

    /// Fail if LaTeX or BibTeX is missing or exits unsuccessfully
    #[arg(long)]
    strict: bool,

    /// Show LaTeX and BibTeX output
    #[arg(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// AppError — semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10 — BibTeX did not produce the .bbl artifact
    ArtifactNotFound(String),
    /// Exit 11 — LaTeX/BibTeX could not be run (or failed, with --strict)
    Toolchain(String),
    /// Exit 12 — cannot write output file
    OutputFile(String),
    /// Exit 13 — input file not found / unreadable
    InputFile(String),
    /// Exit 14 — configuration file not found / invalid
    Config(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::ArtifactNotFound(_) => 10,
            AppError::Toolchain(_) => 11,
            AppError::OutputFile(_) => 12,
            AppError::InputFile(_) => 13,
            AppError::Config(_) => 14,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ArtifactNotFound(msg) => {
                write!(
                    f,
                    "{}\n  hint: BibTeX did not write a bibliography; run with --verbose to see its output",
                    msg
                )
            }
            AppError::Toolchain(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that LaTeX and BibTeX are installed and on PATH",
                    msg
                )
            }
            AppError::OutputFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the output directory exists and is writable",
                    msg
                )
            }
            AppError::InputFile(msg) => {
                write!(f, "{}\n  hint: verify the file path is correct", msg)
            }
            AppError::Config(msg) => {
                write!(
                    f,
                    "{}\n  hint: see 'doxybib build --help' for the available settings",
                    msg
                )
            }
        }
    }
}

impl From<ArtifactError> for AppError {
    fn from(e: ArtifactError) -> Self {
        match e {
            ArtifactError::NotFound(_) => AppError::ArtifactNotFound(e.to_string()),
            _ => AppError::InputFile(e.to_string()),
        }
    }
}

impl From<ToolchainError> for AppError {
    fn from(e: ToolchainError) -> Self {
        AppError::Toolchain(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        None => build_command(BuildArgs::default())?,
        Some(Commands::Build(args)) => build_command(args)?,
        Some(Commands::Convert { input, output }) => {
            convert_command(&input, output.as_deref())?;
        }
        Some(Commands::Rules { json }) => rules_command(json)?,
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Merges the config file (if any) with command-line overrides.
fn resolve_config(args: BuildArgs) -> Result<Config, AppError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .map_err(|e| AppError::Config(format!("'{}': {}", path.display(), e)))?,
        None => Config::default(),
    };

    if let Some(database) = args.database {
        config.database = database;
    }
    if let Some(style) = args.style {
        config.style = style;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(dir) = args.dir {
        config.work_dir = dir;
    }
    if let Some(compiler) = args.compiler {
        config.compiler = compiler;
    }
    if let Some(formatter) = args.formatter {
        config.formatter = formatter;
    }
    config.strict |= args.strict;
    config.verbose |= args.verbose;

    Ok(config)
}

/// Run the toolchain and convert its output.
fn build_command(args: BuildArgs) -> Result<(), AppError> {
    let config = resolve_config(args)?;

    // 1. Remove the stale .bbl, run LaTeX, run BibTeX
    let report = toolchain::run(&config)?;
    for failed in report.failures() {
        eprintln!("warning: {} {}", failed.program, failed.status);
    }

    // 2. Load the .bbl
    let bbl = load_artifact(&report.artifact)?;

    // 3. Convert to HTML
    let html = convert(&bbl);

    // 4. Write the fragment
    let output_path = config.output_path();
    write_output(&output_path, &html).map_err(|e| AppError::OutputFile(e.to_string()))?;
    eprintln!("wrote {} ({} bytes)", output_path.display(), html.len());

    Ok(())
}

/// Convert an existing .bbl file.
fn convert_command(input: &Path, output: Option<&Path>) -> Result<(), AppError> {
    let bbl = if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AppError::InputFile(format!("failed to read from stdin: {}", e)))?;
        buf
    } else if input.exists() {
        load_artifact(input).map_err(|e| AppError::InputFile(e.to_string()))?
    } else {
        return Err(AppError::InputFile(format!(
            "'{}': no such file",
            input.display()
        )));
    };

    let html = convert(&bbl);

    if let Some(output_path) = output {
        write_output(output_path, &html).map_err(|e| AppError::OutputFile(e.to_string()))?;
        eprintln!("wrote {} ({} bytes)", output_path.display(), html.len());
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{}", html)
            .map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))?;
    }

    Ok(())
}

/// List the substitution rules.
fn rules_command(json: bool) -> Result<(), AppError> {
    if json {
        let rendered = serde_json::to_string_pretty(RULES)
            .map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))?;
        println!("{}", rendered);
    } else {
        for (i, rule) in RULES.iter().enumerate() {
            println!("{:>2}. {:<14} {}", i + 1, rule.name, rule.rationale);
        }
    }
    Ok(())
}
