//! Spec-result protocol spoken by engines on stdout.
//!
//! A successful engine run prints exactly one payload and nothing on stderr. Two payload shapes are accepted:
//!
//! - **v0 (legacy)**: a bare JSON array of spec results.
//! - **v1**: an envelope `{"schema": "crossrun.spec-results.v1", "results": [...]}`.
//!
//! Each result is `{"fullName": string, "status": string, "failedExpectations": [{"message": string}]}`.
//! Unknown fields are ignored so reporters can attach extra data.
//!
//! ## Notes
//! - Text that is not JSON at all is [`PayloadError::Malformed`]; JSON of the wrong shape is
//!   [`PayloadError::SchemaViolation`] or [`PayloadError::UnsupportedSchema`]. Callers surface these as different
//!   diagnostic kinds.
//!
//! ## Examples
//! ```rust
//! use crossrun_core::protocol::{parse_payload, SpecStatus};
//!
//! let results = parse_payload(r#"[{"fullName":"a b","status":"passed","failedExpectations":[]}]"#).unwrap();
//! assert_eq!(results[0].status, SpecStatus::Passed);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Schema id of the versioned payload envelope.
pub const SPEC_RESULTS_SCHEMA_V1: &str = "crossrun.spec-results.v1";

/// One spec outcome reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecResult {
    pub full_name: String,
    pub status: SpecStatus,
    #[serde(default)]
    pub failed_expectations: Vec<FailedExpectation>,
}

impl SpecResult {
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

/// A single failed assertion inside a spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedExpectation {
    pub message: String,
}

/// Status of a spec as reported by the framework.
///
/// Statuses the harness does not know are kept verbatim; only [`SpecStatus::Failed`] counts as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpecStatus {
    Passed,
    Failed,
    Pending,
    Excluded,
    Other(String),
}

impl SpecStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SpecStatus::Passed => "passed",
            SpecStatus::Failed => "failed",
            SpecStatus::Pending => "pending",
            SpecStatus::Excluded => "excluded",
            SpecStatus::Other(s) => s,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SpecStatus::Failed)
    }
}

impl From<String> for SpecStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "passed" => SpecStatus::Passed,
            "failed" => SpecStatus::Failed,
            "pending" => SpecStatus::Pending,
            "excluded" => SpecStatus::Excluded,
            _ => SpecStatus::Other(s),
        }
    }
}

impl From<SpecStatus> for String {
    fn from(status: SpecStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for SpecStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an engine's stdout could not be turned into spec results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("output is not valid JSON: {message}")]
    Malformed { message: String },

    #[error("output violates the spec-result schema at {path}: {message}")]
    SchemaViolation { path: String, message: String },

    #[error("unsupported spec-result schema `{0}`")]
    UnsupportedSchema(String),
}

impl PayloadError {
    /// `true` when the text was not JSON at all.
    pub fn is_malformed(&self) -> bool {
        matches!(self, PayloadError::Malformed { .. })
    }

    fn violation(path: impl Into<String>, message: impl Into<String>) -> Self {
        PayloadError::SchemaViolation {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Parse and validate an engine payload.
pub fn parse_payload(raw: &str) -> Result<Vec<SpecResult>, PayloadError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| PayloadError::Malformed { message: e.to_string() })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut envelope) => {
            match envelope.get("schema").and_then(Value::as_str) {
                Some(SPEC_RESULTS_SCHEMA_V1) => {}
                Some(other) => return Err(PayloadError::UnsupportedSchema(other.to_string())),
                None => {
                    return Err(PayloadError::violation(
                        "$",
                        "expected an array or an envelope with a `schema` field",
                    ));
                }
            }
            match envelope.remove("results") {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    return Err(PayloadError::violation(
                        "$.results",
                        format!("expected an array, found {}", json_kind(&other)),
                    ));
                }
                None => return Err(PayloadError::violation("$.results", "missing field")),
            }
        }
        other => {
            return Err(PayloadError::violation(
                "$",
                format!("expected an array, found {}", json_kind(&other)),
            ));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| validate_result(index, item))
        .collect()
}

fn validate_result(index: usize, item: Value) -> Result<SpecResult, PayloadError> {
    let path = format!("$[{index}]");
    if !item.is_object() {
        return Err(PayloadError::violation(
            path,
            format!("expected an object, found {}", json_kind(&item)),
        ));
    }
    let result: SpecResult =
        serde_json::from_value(item).map_err(|e| PayloadError::violation(path.clone(), e.to_string()))?;
    if result.full_name.is_empty() {
        return Err(PayloadError::violation(format!("{path}.fullName"), "must not be empty"));
    }
    if result.status.as_str().is_empty() {
        return Err(PayloadError::violation(format!("{path}.status"), "must not be empty"));
    }
    Ok(result)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_array_payload() {
        let raw = r#"[
            {"fullName": "suite passes", "status": "passed", "failedExpectations": []},
            {"fullName": "suite fails", "status": "failed",
             "failedExpectations": [{"message": "Expected 1 to be 2."}], "id": "spec1"}
        ]"#;
        let results = parse_payload(raw).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].full_name, "suite passes");
        assert!(!results[0].is_failure());
        assert!(results[1].is_failure());
        assert_eq!(results[1].failed_expectations[0].message, "Expected 1 to be 2.");
    }

    #[test]
    fn test_versioned_envelope() {
        let raw = r#"{"schema": "crossrun.spec-results.v1", "results": [{"fullName": "x", "status": "pending"}]}"#;
        let results = parse_payload(raw).unwrap();
        assert_eq!(results[0].status, SpecStatus::Pending);
        assert!(results[0].failed_expectations.is_empty());
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let results = parse_payload(r#"[{"fullName": "x", "status": "flaky"}]"#).unwrap();
        assert_eq!(results[0].status, SpecStatus::Other("flaky".to_string()));
        assert!(!results[0].is_failure());
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = parse_payload("ReferenceError: describe is not defined").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_empty_output_is_malformed() {
        assert!(parse_payload("").unwrap_err().is_malformed());
    }

    #[test]
    fn test_wrong_shape_is_schema_violation() {
        let err = parse_payload(r#"{"fullName": "x"}"#).unwrap_err();
        assert!(matches!(err, PayloadError::SchemaViolation { ref path, .. } if path == "$"));

        let err = parse_payload(r#"[{"status": "passed"}]"#).unwrap_err();
        assert!(matches!(err, PayloadError::SchemaViolation { ref path, .. } if path == "$[0]"));

        let err = parse_payload(r#"[{"fullName": "", "status": "passed"}]"#).unwrap_err();
        assert!(matches!(err, PayloadError::SchemaViolation { ref path, .. } if path == "$[0].fullName"));

        let err = parse_payload("[1]").unwrap_err();
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_unsupported_schema() {
        let err = parse_payload(r#"{"schema": "crossrun.spec-results.v9", "results": []}"#).unwrap_err();
        assert_eq!(err, PayloadError::UnsupportedSchema("crossrun.spec-results.v9".to_string()));
    }

    #[test]
    fn test_status_serializes_as_string() {
        let result = SpecResult {
            full_name: "a".to_string(),
            status: SpecStatus::Failed,
            failed_expectations: vec![],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"fullName":"a","status":"failed","failedExpectations":[]}"#);
    }
}
