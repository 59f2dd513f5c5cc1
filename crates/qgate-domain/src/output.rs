//! Validator output contract.
//!
//! Every validator reports through the same [`ValidatorOutput`] shape so that
//! downstream tooling (the contracts summarizer, the quality gate) never has
//! to special-case a check. [`build_result`] is the only constructor that
//! upholds the `ok == (errorCount == 0) == errors.is_empty()` invariant;
//! [`emit_result`] prints the result and maps it to a process exit status.

use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error_codes::common;

/// Contract version carried by every [`ValidatorOutput`].
pub const VALIDATOR_OUTPUT_CONTRACT_VERSION: u32 = 1;

/// A single contract violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Stable code from the error taxonomy registry.
    pub code: String,
    /// Dotted path into the offending artifact (`checks[2].status`).
    pub field: String,
    /// Actionable, human-readable message.
    pub message: String,
}

impl ValidationError {
    pub fn new(code: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// An error without a registered code.
    ///
    /// Falls back to `VALIDATION_ERROR` on field `unknown`; a registered
    /// validator should never need this.
    pub fn untagged(message: impl Into<String>) -> Self {
        Self::new(common::ERROR, "unknown", message)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.field, self.message)
    }
}

/// Uniform result of a validator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorOutput {
    pub contract_version: u32,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub error_count: usize,
    pub errors: Vec<ValidationError>,
    /// Validator-specific fields (`supportedSchemaVersion`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ValidatorOutput {
    /// Attach an extra top-level field.
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Broken invariants of a value read back from disk, one line each.
    pub fn contract_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.contract_version != VALIDATOR_OUTPUT_CONTRACT_VERSION {
            violations.push(format!(
                "contractVersion ({}) must be {}.",
                self.contract_version, VALIDATOR_OUTPUT_CONTRACT_VERSION
            ));
        }
        if self.error_count != self.errors.len() {
            violations.push(format!(
                "errorCount ({}) does not match errors ({}).",
                self.error_count,
                self.errors.len()
            ));
        }
        if self.ok != (self.error_count == 0) {
            violations.push(format!(
                "ok ({}) does not match errorCount ({}).",
                self.ok, self.error_count
            ));
        }
        violations
    }

    /// Whether a value read back from disk still upholds the contract.
    pub fn is_consistent(&self) -> bool {
        self.contract_violations().is_empty()
    }

    /// Error codes in first-seen order, without duplicates.
    pub fn unique_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for error in &self.errors {
            let code = error.code.trim();
            if !code.is_empty() && !codes.iter().any(|c| c == code) {
                codes.push(code.to_string());
            }
        }
        codes
    }
}

/// Build a [`ValidatorOutput`] from collected errors.
pub fn build_result(file: Option<&str>, errors: Vec<ValidationError>) -> ValidatorOutput {
    ValidatorOutput {
        contract_version: VALIDATOR_OUTPUT_CONTRACT_VERSION,
        ok: errors.is_empty(),
        file: file.map(|f| f.to_string()),
        error_count: errors.len(),
        errors,
        extra: BTreeMap::new(),
    }
}

/// How a validator result is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

/// Print a result and return the process exit status (`0` when ok).
///
/// JSON mode always prints the full result, pass or fail. Text mode prints
/// `success_message`, or `"<failure_prefix>: failed."` followed by one
/// `- <message>` line per error. Write failures on `out` are ignored.
pub fn emit_result<W: Write>(
    result: &ValidatorOutput,
    mode: OutputMode,
    success_message: &str,
    failure_prefix: &str,
    out: &mut W,
) -> i32 {
    let code = if result.ok { 0 } else { 1 };
    match mode {
        OutputMode::Json => match serde_json::to_string_pretty(result) {
            Ok(json) => {
                let _ = writeln!(out, "{}", json);
                code
            }
            Err(e) => {
                let _ = writeln!(out, "{}: failed: {}", failure_prefix, e);
                1
            }
        },
        OutputMode::Text => {
            if result.ok {
                let _ = writeln!(out, "{}", success_message);
            } else {
                let _ = writeln!(out, "{}: failed.", failure_prefix);
                for error in &result.errors {
                    let _ = writeln!(out, "- {}", error.message);
                }
            }
            code
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_error() -> ValidationError {
        ValidationError::new("X_CODE", "field.a", "field.a is wrong")
    }

    #[test]
    fn test_build_result_ok_tracks_error_count() {
        let ok = build_result(Some("a.json"), vec![]);
        assert!(ok.ok);
        assert_eq!(ok.error_count, 0);
        assert!(ok.is_consistent());

        let failed = build_result(None, vec![sample_error(), sample_error()]);
        assert!(!failed.ok);
        assert_eq!(failed.error_count, 2);
        assert_eq!(failed.errors.len(), 2);
        assert!(failed.is_consistent());
    }

    #[test]
    fn test_untagged_defaults_code_and_field() {
        let err = ValidationError::untagged("something broke");
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.field, "unknown");
    }

    #[test]
    fn test_emit_text_success() {
        let mut out = Vec::new();
        let code = emit_result(
            &build_result(None, vec![]),
            OutputMode::Text,
            "Thing validation: passed.",
            "Thing validation",
            &mut out,
        );
        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "Thing validation: passed.\n");
    }

    #[test]
    fn test_emit_text_failure_lists_messages() {
        let mut out = Vec::new();
        let code = emit_result(
            &build_result(None, vec![sample_error()]),
            OutputMode::Text,
            "ok",
            "Thing validation",
            &mut out,
        );
        assert_eq!(code, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Thing validation: failed.\n"));
        assert!(text.contains("- field.a is wrong"));
    }

    #[test]
    fn test_emit_json_prints_failures_too() {
        let mut out = Vec::new();
        let result = build_result(Some("x.json"), vec![sample_error()])
            .with_extra("supportedSchemaVersion", 1);
        let code = emit_result(&result, OutputMode::Json, "ok", "Thing", &mut out);
        assert_eq!(code, 1);
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["contractVersion"], 1);
        assert_eq!(parsed["ok"], false);
        assert_eq!(parsed["file"], "x.json");
        assert_eq!(parsed["errorCount"], 1);
        assert_eq!(parsed["supportedSchemaVersion"], 1);
        assert_eq!(parsed["errors"][0]["code"], "X_CODE");
    }

    #[test]
    fn test_read_back_detects_inconsistent_counts() {
        let raw = r#"{"contractVersion":1,"ok":true,"errorCount":1,"errors":[]}"#;
        let parsed: ValidatorOutput = serde_json::from_str(raw).unwrap();
        assert!(!parsed.is_consistent());
    }

    #[test]
    fn test_contract_violations_name_each_broken_invariant() {
        let raw = r#"{"contractVersion":99,"ok":true,"errorCount":3,"errors":[]}"#;
        let parsed: ValidatorOutput = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.contract_violations(),
            vec![
                "contractVersion (99) must be 1.",
                "errorCount (3) does not match errors (0).",
                "ok (true) does not match errorCount (3).",
            ]
        );
        assert!(build_result(None, Vec::new()).contract_violations().is_empty());
    }

    #[test]
    fn test_unique_codes_keeps_first_seen_order() {
        let result = build_result(
            None,
            vec![
                ValidationError::new("B", "f", "m"),
                ValidationError::new("A", "f", "m"),
                ValidationError::new("B", "f", "m"),
            ],
        );
        assert_eq!(result.unique_codes(), vec!["B".to_string(), "A".to_string()]);
    }
}
