//! Per-check selective decision contract.

use serde_json::{json, Value};

use qgate_domain::error_codes::selective_decision as codes;
use qgate_domain::schema::SELECTIVE_DECISION_CONTRACT_VERSION;
use qgate_domain::ValidationError;

use super::json::{field_path, is_version, non_empty_str, non_negative_integer, string_array};
use super::{ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::Result;

pub struct SelectiveDecisionValidator;

impl ArtifactValidator for SelectiveDecisionValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::SelectiveDecision
    }

    fn title(&self) -> &'static str {
        "Selective decision"
    }

    fn default_file(&self) -> Option<&'static str> {
        Some("test-results/selective-decision.json")
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        Ok(validate_detailed(&input.content))
    }

    fn extra(&self) -> Vec<(&'static str, Value)> {
        vec![(
            "supportedContractVersion",
            json!(SELECTIVE_DECISION_CONTRACT_VERSION),
        )]
    }
}

pub fn validate_detailed(raw: &str) -> Vec<ValidationError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => validate_value(&value, ""),
        Err(e) => vec![ValidationError::new(
            codes::INVALID_JSON,
            "json",
            format!("Invalid JSON payload: {}", e),
        )],
    }
}

/// Validate one decision object; `prefix` roots the reported field paths.
pub fn validate_value(value: &Value, prefix: &str) -> Vec<ValidationError> {
    let Some(obj) = value.as_object() else {
        let field = if prefix.is_empty() { "payload" } else { prefix };
        return vec![ValidationError::new(
            codes::INVALID_PAYLOAD_OBJECT,
            field,
            format!("{} must be a JSON object.", describe(prefix)),
        )];
    };
    let path = |name: &str| field_path(prefix, name);
    let mut errors = Vec::new();

    if !is_version(obj.get("contractVersion"), SELECTIVE_DECISION_CONTRACT_VERSION) {
        errors.push(ValidationError::new(
            codes::INVALID_CONTRACT_VERSION,
            path("contractVersion"),
            format!(
                "{} must be {}.",
                path("contractVersion"),
                SELECTIVE_DECISION_CONTRACT_VERSION
            ),
        ));
    }

    if non_empty_str(obj.get("check")).is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_CHECK,
            path("check"),
            format!("{} must be a non-empty string.", path("check")),
        ));
    }

    let decision = obj
        .get("decision")
        .and_then(Value::as_str)
        .filter(|d| *d == "run" || *d == "skip");
    if decision.is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_DECISION,
            path("decision"),
            format!("{} must be \"run\" or \"skip\".", path("decision")),
        ));
    }

    let should_run = obj.get("shouldRun").and_then(Value::as_bool);
    if should_run.is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_SHOULD_RUN,
            path("shouldRun"),
            format!("{} must be a boolean.", path("shouldRun")),
        ));
    }
    if let (Some(decision), Some(should_run)) = (decision, should_run) {
        if should_run != (decision == "run") {
            errors.push(ValidationError::new(
                codes::DECISION_MISMATCH,
                path("shouldRun"),
                format!(
                    "{} ({}) contradicts decision \"{}\".",
                    path("shouldRun"),
                    should_run,
                    decision
                ),
            ));
        }
    }

    if non_empty_str(obj.get("reason")).is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_REASON,
            path("reason"),
            format!("{} must be a non-empty string.", path("reason")),
        ));
    }

    let mut count = |name: &str| {
        let value = non_negative_integer(obj.get(name));
        if value.is_none() {
            errors.push(ValidationError::new(
                codes::INVALID_COUNT_FIELD,
                path(name),
                format!("{} must be a non-negative integer.", path(name)),
            ));
        }
        value
    };
    let scanned = count("changedFilesScanned");
    let relevant = count("relevantMatches");
    count("targetedTests");

    let matched = string_array(obj.get("matchedFiles"));
    if matched.is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_MATCHED_FILES,
            path("matchedFiles"),
            format!("{} must be an array of strings.", path("matchedFiles")),
        ));
    }

    if let (Some(matched), Some(relevant), Some(scanned)) = (&matched, relevant, scanned) {
        let matched = matched.len() as u64;
        if matched > relevant || relevant > scanned {
            errors.push(ValidationError::new(
                codes::MATCH_COUNT_MISMATCH,
                path("relevantMatches"),
                format!(
                    "Expected matchedFiles ({}) <= relevantMatches ({}) <= changedFilesScanned ({}).",
                    matched, relevant, scanned
                ),
            ));
        }
    }

    if obj.get("dryRun").and_then(Value::as_bool).is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_DRY_RUN,
            path("dryRun"),
            format!("{} must be a boolean.", path("dryRun")),
        ));
    }

    errors
}

fn describe(prefix: &str) -> String {
    if prefix.is_empty() {
        "Selective decision payload".to_string()
    } else {
        prefix.to_string()
    }
}
