//! Engine execution
//!
//! Every (engine, program) pair runs exactly once, engine-major: all programs on the first registered engine,
//! then all programs on the next. Runs are sequential and blocking. The harness waits for each child to exit.
//!
//! ## Outcome classification
//!
//! | Condition                                   | Outcome                                |
//! |---------------------------------------------|----------------------------------------|
//! | temp file or spawn failed                   | `Diagnostic::LaunchFailure`            |
//! | stderr not empty (stdout ignored)           | `Diagnostic::EngineError`              |
//! | stdout not JSON                             | `Diagnostic::MalformedOutput`          |
//! | stdout JSON but not a spec-result payload   | `Diagnostic::SchemaViolation`          |
//! | otherwise                                   | `ExecutionOutcome::Results`            |

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crossrun_core::{SpecResult, parse_payload};
use serde::Serialize;

use super::assembler::AssembledProgram;
use super::registry::EngineDescriptor;

/// Captured output of one engine process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Why a run produced no results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The engine wrote to stderr.
    EngineError { stderr: String },
    /// stdout was not JSON.
    MalformedOutput { error: String, raw: String },
    /// stdout was JSON but not a valid payload.
    SchemaViolation { error: String, raw: String },
    /// The program file could not be written or the engine could not be started.
    LaunchFailure { error: String },
}

impl Diagnostic {
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::EngineError { .. } => "engine error",
            Diagnostic::MalformedOutput { .. } => "malformed output",
            Diagnostic::SchemaViolation { .. } => "schema violation",
            Diagnostic::LaunchFailure { .. } => "launch failure",
        }
    }

    /// Raw text captured from the engine, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Diagnostic::EngineError { stderr } => Some(stderr),
            Diagnostic::MalformedOutput { raw, .. } | Diagnostic::SchemaViolation { raw, .. } => Some(raw),
            Diagnostic::LaunchFailure { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EngineError { .. } => f.write_str(self.kind()),
            Diagnostic::MalformedOutput { error, .. }
            | Diagnostic::SchemaViolation { error, .. }
            | Diagnostic::LaunchFailure { error } => write!(f, "{}: {}", self.kind(), error),
        }
    }
}

/// Result of one (engine, program) pair: parsed results or a diagnostic, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Results(Vec<SpecResult>),
    Diagnostic(Diagnostic),
}

impl ExecutionOutcome {
    /// Classify captured engine output.
    pub fn classify(output: RawOutput) -> Self {
        if !output.stderr.is_empty() {
            return ExecutionOutcome::Diagnostic(Diagnostic::EngineError { stderr: output.stderr });
        }
        match parse_payload(&output.stdout) {
            Ok(results) => ExecutionOutcome::Results(results),
            Err(e) if e.is_malformed() => ExecutionOutcome::Diagnostic(Diagnostic::MalformedOutput {
                error: e.to_string(),
                raw: output.stdout,
            }),
            Err(e) => ExecutionOutcome::Diagnostic(Diagnostic::SchemaViolation {
                error: e.to_string(),
                raw: output.stdout,
            }),
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            ExecutionOutcome::Diagnostic(d) => Some(d),
            ExecutionOutcome::Results(_) => None,
        }
    }
}

/// One entry of the run matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub engine: String,
    pub spec_path: PathBuf,
    pub outcome: ExecutionOutcome,
}

/// Runs a program on an engine and captures its output.
///
/// Implementations must block until the engine has exited.
pub trait EngineExecutor {
    fn execute(&self, engine: &EngineDescriptor, program: &AssembledProgram) -> std::io::Result<RawOutput>;
}

/// Writes the program to a fresh temp file and runs `<engine> <file>`.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

impl EngineExecutor for ProcessExecutor {
    fn execute(&self, engine: &EngineDescriptor, program: &AssembledProgram) -> std::io::Result<RawOutput> {
        // Removed when dropped, after the engine has exited.
        let mut file = tempfile::Builder::new().prefix("crossrun-").suffix(".js").tempfile()?;
        file.write_all(program.source.as_bytes())?;
        file.flush()?;

        let output = Command::new(&engine.path)
            .arg(file.path())
            .stdin(Stdio::null())
            .output()?;

        Ok(RawOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run one pair. Executor errors become [`Diagnostic::LaunchFailure`].
pub fn run_one<E: EngineExecutor>(executor: &E, engine: &EngineDescriptor, program: &AssembledProgram) -> RunRecord {
    let outcome = match executor.execute(engine, program) {
        Ok(output) => ExecutionOutcome::classify(output),
        Err(e) => ExecutionOutcome::Diagnostic(Diagnostic::LaunchFailure { error: e.to_string() }),
    };

    match &outcome {
        ExecutionOutcome::Results(results) => {
            tracing::debug!(
                engine = %engine.name,
                spec = %program.spec_path.display(),
                results = results.len(),
                "run complete"
            );
        }
        ExecutionOutcome::Diagnostic(diagnostic) => {
            tracing::warn!(
                engine = %engine.name,
                spec = %program.spec_path.display(),
                raw = diagnostic.raw().unwrap_or(""),
                "{}",
                diagnostic
            );
        }
    }

    RunRecord {
        engine: engine.name.clone(),
        spec_path: program.spec_path.clone(),
        outcome,
    }
}

/// Run every program on every engine, engine-major.
#[tracing::instrument(skip_all, fields(engines = engines.len(), programs = programs.len()))]
pub fn run_matrix<E: EngineExecutor>(
    executor: &E,
    engines: &[EngineDescriptor],
    programs: &[AssembledProgram],
) -> Vec<RunRecord> {
    let mut records = Vec::with_capacity(engines.len() * programs.len());
    for engine in engines {
        for program in programs {
            records.push(run_one(executor, engine, program));
        }
    }
    records
}
