//! Result aggregation and reporting
//!
//! Aggregation is two passes over the run records:
//!
//! 1. one status line per spec result, in run order;
//! 2. one [`FailureRecord`] per result whose status is `failed`.
//!
//! Runs that ended in a diagnostic contribute no status lines; they are listed separately and counted as excluded.
//!
//! ## Reporter Trait
//!
//! Rendering is behind the [`Reporter`] trait. [`TextReporter`] prints the plain-text report, [`JsonReporter`] a
//! machine-readable document.

use std::io::{self, Write};
use std::path::PathBuf;

use crossrun_core::{SpecResult, SpecStatus};
use serde::Serialize;

use super::runner::{Diagnostic, ExecutionOutcome, RunRecord};

/// `(<engine>) <full name>: <STATUS>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub engine: String,
    pub full_name: String,
    pub status: SpecStatus,
}

/// A failed spec with the run it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub engine: String,
    pub spec_path: PathBuf,
    pub result: SpecResult,
}

/// A run excluded from statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    pub engine: String,
    pub spec_path: PathBuf,
    pub diagnostic: Diagnostic,
}

/// Counts over all runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    /// Pending, excluded and unknown statuses.
    pub other: usize,
    /// Runs that ended in a diagnostic.
    pub excluded_runs: usize,
    pub runs: usize,
}

/// Aggregated view of a run matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub status_lines: Vec<StatusLine>,
    pub failures: Vec<FailureRecord>,
    pub diagnostics: Vec<DiagnosticRecord>,
    pub tally: Tally,
}

impl Report {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// No failures, and with `strict` also no diagnostics.
    pub fn is_success(&self, strict: bool) -> bool {
        !self.has_failures() && !(strict && !self.diagnostics.is_empty())
    }
}

/// Build a report from run records. The input is not modified.
pub fn aggregate(records: &[RunRecord]) -> Report {
    let mut report = Report {
        tally: Tally {
            runs: records.len(),
            ..Tally::default()
        },
        ..Report::default()
    };

    for record in records {
        match &record.outcome {
            ExecutionOutcome::Results(results) => {
                for result in results {
                    match result.status {
                        SpecStatus::Passed => report.tally.passed += 1,
                        SpecStatus::Failed => report.tally.failed += 1,
                        _ => report.tally.other += 1,
                    }
                    report.status_lines.push(StatusLine {
                        engine: record.engine.clone(),
                        full_name: result.full_name.clone(),
                        status: result.status.clone(),
                    });
                }
            }
            ExecutionOutcome::Diagnostic(diagnostic) => {
                report.tally.excluded_runs += 1;
                report.diagnostics.push(DiagnosticRecord {
                    engine: record.engine.clone(),
                    spec_path: record.spec_path.clone(),
                    diagnostic: diagnostic.clone(),
                });
            }
        }
    }

    for record in records {
        if let ExecutionOutcome::Results(results) = &record.outcome {
            report.failures.extend(results.iter().filter(|r| r.is_failure()).map(|r| FailureRecord {
                engine: record.engine.clone(),
                spec_path: record.spec_path.clone(),
                result: r.clone(),
            }));
        }
    }

    report
}

// ============================================================================
// Reporters
// ============================================================================

/// Renders a report.
pub trait Reporter {
    fn write_report(&self, report: &Report, out: &mut dyn Write) -> io::Result<()>;

    /// Render to a string. Fails only when the reporter itself does, e.g. on a serialization error.
    fn render(&self, report: &Report) -> io::Result<String> {
        let mut buf = Vec::new();
        self.write_report(report, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Plain-text report.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReporter;

impl Reporter for TextReporter {
    fn write_report(&self, report: &Report, out: &mut dyn Write) -> io::Result<()> {
        for line in &report.status_lines {
            writeln!(
                out,
                "({}) {}: {}",
                line.engine,
                line.full_name,
                line.status.as_str().to_uppercase()
            )?;
        }

        for failure in &report.failures {
            writeln!(out)?;
            writeln!(out, "{} FAILED:", failure.result.full_name)?;
            writeln!(out, "({}) {}", failure.engine, failure.spec_path.display())?;
            for expectation in &failure.result.failed_expectations {
                write_indented(out, &expectation.message)?;
            }
        }

        if !report.diagnostics.is_empty() {
            writeln!(out)?;
            writeln!(out, "EXCLUDED RUNS:")?;
            for record in &report.diagnostics {
                writeln!(
                    out,
                    "({}) {}: {}",
                    record.engine,
                    record.spec_path.display(),
                    record.diagnostic
                )?;
                if let Some(raw) = record.diagnostic.raw().filter(|raw| !raw.trim().is_empty()) {
                    write_indented(out, raw)?;
                }
            }
        }

        let tally = &report.tally;
        writeln!(out)?;
        writeln!(
            out,
            "{} passed, {} failed, {} other ({} runs, {} excluded)",
            tally.passed, tally.failed, tally.other, tally.runs, tally.excluded_runs
        )
    }
}

fn write_indented(out: &mut dyn Write, text: &str) -> io::Result<()> {
    for line in text.trim_end().lines() {
        writeln!(out, "    {}", line)?;
    }
    Ok(())
}

/// Pretty-printed JSON report.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn write_report(&self, report: &Report, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)
    }
}
