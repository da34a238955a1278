//! Property-based tests for the crossrun harness
//!
//! These tests use proptest to verify aggregation and protocol invariants across many randomly generated run
//! matrices.

use std::path::PathBuf;

use crossrun::aggregate;
use crossrun::harness::runner::{Diagnostic, ExecutionOutcome, RunRecord};
use crossrun::protocol::{FailedExpectation, SpecResult, SpecStatus, parse_payload};
use proptest::prelude::*;

fn status() -> impl Strategy<Value = SpecStatus> {
    prop_oneof![
        Just(SpecStatus::Passed),
        Just(SpecStatus::Failed),
        Just(SpecStatus::Pending),
        Just(SpecStatus::Excluded),
        "[a-z]{1,8}".prop_map(SpecStatus::from),
    ]
}

fn spec_result() -> impl Strategy<Value = SpecResult> {
    ("[a-z ]{1,20}", status(), prop::collection::vec("[ -~]{0,30}", 0..3)).prop_map(|(name, status, messages)| {
        SpecResult {
            full_name: name,
            status,
            failed_expectations: messages.into_iter().map(|message| FailedExpectation { message }).collect(),
        }
    })
}

fn outcome() -> impl Strategy<Value = ExecutionOutcome> {
    prop_oneof![
        4 => prop::collection::vec(spec_result(), 0..6).prop_map(ExecutionOutcome::Results),
        1 => "[ -~]{0,20}".prop_map(|stderr| ExecutionOutcome::Diagnostic(Diagnostic::EngineError { stderr })),
    ]
}

fn records() -> impl Strategy<Value = Vec<RunRecord>> {
    prop::collection::vec(
        ("[a-z0-9]{1,6}", outcome()).prop_map(|(engine, outcome)| RunRecord {
            engine,
            spec_path: PathBuf::from("a.spec.js"),
            outcome,
        }),
        0..8,
    )
}

// =============================================================================
// Aggregation Properties
// =============================================================================

proptest! {
    /// Property: one status line per spec result, one failure record per `failed` result
    #[test]
    fn aggregate_counts_match_inputs(records in records()) {
        let report = aggregate(&records);

        let results: Vec<&SpecResult> = records
            .iter()
            .filter_map(|r| match &r.outcome {
                ExecutionOutcome::Results(results) => Some(results),
                ExecutionOutcome::Diagnostic(_) => None,
            })
            .flatten()
            .collect();

        prop_assert_eq!(report.status_lines.len(), results.len());
        prop_assert_eq!(
            report.failures.len(),
            results.iter().filter(|r| r.status == SpecStatus::Failed).count()
        );
        prop_assert_eq!(
            report.tally.passed + report.tally.failed + report.tally.other,
            results.len()
        );
        prop_assert_eq!(report.tally.runs, records.len());
        prop_assert_eq!(report.diagnostics.len(), report.tally.excluded_runs);
    }

    /// Property: aggregation is read-only and deterministic
    #[test]
    fn aggregate_is_deterministic(records in records()) {
        let before = records.clone();
        let first = aggregate(&records);
        let second = aggregate(&records);
        prop_assert_eq!(&records, &before);
        prop_assert_eq!(first, second);
    }

    /// Property: results survive a serialize/parse cycle through the legacy payload form
    #[test]
    fn payload_round_trips(results in prop::collection::vec(spec_result(), 0..5)) {
        let raw = serde_json::to_string(&results).unwrap();
        prop_assert_eq!(parse_payload(&raw).unwrap(), results);
    }
}
