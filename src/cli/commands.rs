//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crossrun_syntax::{format_error, preprocess};

use crate::harness::assembler::write_programs;
use crate::harness::bundler::CommandBundler;
use crate::harness::config::HarnessConfig;
use crate::harness::registry::EngineRegistry;
use crate::harness::report::{JsonReporter, Reporter, TextReporter};
use crate::harness::runner::ProcessExecutor;
use crate::harness::{Harness, HarnessError, assemble_programs};

use super::{CliError, CliResult, ExitCode, OutputFormat};

/// Preparation runs on a tokio runtime; engine execution happens after it, on the calling thread.
fn build_runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("error: failed to start async runtime: {}", e)))
}

/// Prepare, run every (engine, program) pair and print the report.
///
/// Exit status is 1 when any spec failed, or with `strict` when any run was excluded.
pub fn run_harness(config: &HarnessConfig, format: OutputFormat, strict: bool) -> CliResult<ExitCode> {
    let bundler = CommandBundler::new(&config.bundler);
    let harness = build_runtime()?.block_on(Harness::prepare(config, &bundler))?;

    let report = harness.run(&ProcessExecutor);

    let reporter: Box<dyn Reporter> = match format {
        OutputFormat::Text => Box::new(TextReporter),
        OutputFormat::Json => Box::new(JsonReporter),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    reporter
        .write_report(&report, &mut out)
        .and_then(|()| out.flush())
        .map_err(|e| CliError::failure(format!("error: failed to write report: {}", e)))?;

    if report.is_success(strict) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Write every assembled program into `out_dir`.
pub fn assemble(config: &HarnessConfig, out_dir: &Path) -> CliResult<ExitCode> {
    let bundler = CommandBundler::new(&config.bundler);
    let programs = build_runtime()?.block_on(assemble_programs(config, &bundler))?;
    let written = write_programs(out_dir, &programs).map_err(HarnessError::from)?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// Print a spec file after preprocessing.
pub fn preprocess_file(path: &Path) -> CliResult<ExitCode> {
    let source = fs::read_to_string(path)
        .map_err(|e| CliError::failure(format!("error: failed to read {}: {}", path.display(), e)))?;
    match preprocess(&source) {
        Ok(output) => {
            print!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        Err(errs) => {
            let file_name = path.display().to_string();
            let mut msg = String::new();
            for err in &errs {
                msg.push_str(&format_error(&file_name, &source, err));
            }
            Err(CliError::failure(msg.trim_end()))
        }
    }
}

/// List installed engines as `<name>\t<path>`.
pub fn list_engines(config: &HarnessConfig) -> CliResult<ExitCode> {
    let registry = EngineRegistry::load(&config.registry, &config.engines_dir).map_err(HarnessError::from)?;
    if registry.is_empty() {
        eprintln!("no engines installed");
    }
    for engine in registry.engines() {
        println!("{}\t{}", engine.name, engine.path.display());
    }
    Ok(ExitCode::SUCCESS)
}
