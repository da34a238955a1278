//! CLI module for the crossrun harness
//!
//! ## Commands
//!
//! - `run` - Assemble every spec program and run it on every installed engine
//! - `assemble --out <dir>` - Write assembled programs to disk without running engines
//! - `preprocess <file>` - Print a spec file after the embedding rewrites
//! - `engines` - List installed engines
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::harness::HarnessError;
use crate::harness::config::HarnessConfig;
use crate::version::CROSSRUN_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        CliError::failure(format!("error: {}", err))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Cross-engine test harness
#[derive(Parser, Debug)]
#[command(name = "crossrun")]
#[command(version = CROSSRUN_VERSION)]
#[command(about = "Run embedded test programs on standalone script engines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command that reads the harness configuration.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// JSON config file (fields not given keep their defaults)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Engine registry document
    #[arg(long, value_name = "FILE")]
    pub registry: Option<PathBuf>,

    /// Directory holding the engine executables
    #[arg(long = "engines-dir", value_name = "DIR")]
    pub engines_dir: Option<PathBuf>,

    /// Glob selecting spec files
    #[arg(long, value_name = "GLOB")]
    pub specs: Option<String>,

    /// Bundler command
    #[arg(long, value_name = "COMMAND")]
    pub bundler: Option<String>,
}

impl ConfigArgs {
    /// Load the config file (or defaults) and apply flag overrides.
    pub fn resolve(&self) -> CliResult<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path).map_err(HarnessError::from)?,
            None => HarnessConfig::default(),
        };
        if let Some(registry) = &self.registry {
            config = config.with_registry(registry);
        }
        if let Some(dir) = &self.engines_dir {
            config = config.with_engines_dir(dir);
        }
        if let Some(glob) = &self.specs {
            config = config.with_spec_glob(glob);
        }
        if let Some(bundler) = &self.bundler {
            config = config.with_bundler(bundler);
        }
        Ok(config)
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every spec on every installed engine
    Run {
        #[command(flatten)]
        config: ConfigArgs,
        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Also fail when a run was excluded by a diagnostic
        #[arg(long)]
        strict: bool,
        /// Write generated bundles to this directory
        #[arg(long = "emit-bundles", value_name = "DIR")]
        emit_bundles: Option<PathBuf>,
    },

    /// Write assembled programs to a directory without running engines
    Assemble {
        #[command(flatten)]
        config: ConfigArgs,
        /// Output directory
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
        /// Write generated bundles to this directory
        #[arg(long = "emit-bundles", value_name = "DIR")]
        emit_bundles: Option<PathBuf>,
    },

    /// Print a spec file after the embedding rewrites
    Preprocess {
        /// Spec file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List installed engines
    Engines {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Run {
            config,
            format,
            strict,
            emit_bundles,
        } => {
            let config = with_emit_bundles(config.resolve()?, emit_bundles);
            commands::run_harness(&config, format, strict)
        }
        Command::Assemble {
            config,
            out,
            emit_bundles,
        } => {
            let config = with_emit_bundles(config.resolve()?, emit_bundles);
            commands::assemble(&config, &out)
        }
        Command::Preprocess { file } => commands::preprocess_file(&file),
        Command::Engines { config } => commands::list_engines(&config.resolve()?),
    }
}

fn with_emit_bundles(config: HarnessConfig, dir: Option<PathBuf>) -> HarnessConfig {
    match dir {
        Some(dir) => config.with_emit_bundles(dir),
        None => config,
    }
}

// ============================================================================
// Tests
// ============================================================================
