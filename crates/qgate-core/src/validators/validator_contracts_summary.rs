//! Validator contracts summary, validated by full recomputation.
//!
//! Every aggregate field is re-derived from `checks[]` independently of the
//! summarizer that wrote it; any stored value that disagrees is reported.

use serde_json::{json, Value};

use qgate_domain::error_codes::validator_contracts_summary as codes;
use qgate_domain::schema::{unique_in_order, VALIDATOR_CONTRACTS_SUMMARY_SCHEMA_VERSION};
use qgate_domain::{CheckStatus, ValidationError};

use super::json::{is_version, non_empty_str, non_negative_integer, parse_object};
use super::{ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::Result;

const COUNT_FIELDS: [&str; 5] = [
    "checkCount",
    "passCount",
    "failCount",
    "warningCount",
    "totalErrors",
];

pub struct ValidatorContractsSummaryValidator;

impl ArtifactValidator for ValidatorContractsSummaryValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::ValidatorContractsSummary
    }

    fn title(&self) -> &'static str {
        "Validator contracts summary"
    }

    fn default_file(&self) -> Option<&'static str> {
        Some("test-results/validator-contracts-summary.json")
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        Ok(validate_detailed(&input.content))
    }

    fn extra(&self) -> Vec<(&'static str, Value)> {
        vec![(
            "supportedSchemaVersion",
            json!(VALIDATOR_CONTRACTS_SUMMARY_SCHEMA_VERSION),
        )]
    }
}

fn parse_status(value: Option<&Value>) -> Option<CheckStatus> {
    value.and_then(Value::as_str).and_then(|s| s.parse().ok())
}

fn allowed_statuses() -> String {
    CheckStatus::ALL
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Default)]
struct Recomputed {
    pass: usize,
    fail: usize,
    warning: usize,
    total_errors: u64,
    codes: Vec<String>,
}

pub fn validate_detailed(raw: &str) -> Vec<ValidationError> {
    let payload = match parse_object(
        raw,
        codes::INVALID_JSON,
        codes::INVALID_PAYLOAD_OBJECT,
        "Validator contracts summary",
    ) {
        Ok(payload) => payload,
        Err(e) => return vec![e],
    };
    let mut errors = Vec::new();

    if !is_version(
        payload.get("schemaVersion"),
        VALIDATOR_CONTRACTS_SUMMARY_SCHEMA_VERSION,
    ) {
        errors.push(ValidationError::new(
            codes::INVALID_SCHEMA_VERSION,
            "schemaVersion",
            format!(
                "schemaVersion must be {}.",
                VALIDATOR_CONTRACTS_SUMMARY_SCHEMA_VERSION
            ),
        ));
    }

    let overall_status = parse_status(payload.get("overallStatus"));
    if overall_status.is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_OVERALL_STATUS,
            "overallStatus",
            format!("overallStatus must be one of: {}.", allowed_statuses()),
        ));
    }

    for field in COUNT_FIELDS {
        if non_negative_integer(payload.get(field)).is_none() {
            errors.push(ValidationError::new(
                codes::INVALID_COUNT_FIELD,
                field,
                format!("{} must be a non-negative integer.", field),
            ));
        }
    }

    let checks = payload.get("checks").and_then(Value::as_array);
    if checks.is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_CHECKS_ARRAY,
            "checks",
            "checks must be an array.",
        ));
    }
    let top_codes = payload.get("errorCodes").and_then(Value::as_array);
    if top_codes.is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_ERROR_CODES_ARRAY,
            "errorCodes",
            "errorCodes must be an array.",
        ));
    }
    let (Some(checks), Some(top_codes)) = (checks, top_codes) else {
        return errors;
    };

    let mut recomputed = Recomputed::default();
    for (index, check) in checks.iter().enumerate() {
        validate_check(check, index, &mut recomputed, &mut errors);
    }

    let stored = |field: &str| non_negative_integer(payload.get(field));
    let count_checks: [(&str, u64, &str); 5] = [
        ("checkCount", checks.len() as u64, "checks length"),
        ("passCount", recomputed.pass as u64, "computed value"),
        ("failCount", recomputed.fail as u64, "computed value"),
        ("warningCount", recomputed.warning as u64, "computed value"),
        ("totalErrors", recomputed.total_errors, "computed value"),
    ];
    for (field, expected, label) in count_checks {
        if let Some(actual) = stored(field) {
            if actual != expected {
                errors.push(ValidationError::new(
                    codes::COUNT_MISMATCH,
                    field,
                    format!(
                        "{} ({}) does not match {} ({}).",
                        field, actual, label, expected
                    ),
                ));
            }
        }
    }

    let expected_status = CheckStatus::from_counts(recomputed.fail, recomputed.warning);
    if let Some(actual) = overall_status {
        if actual != expected_status {
            errors.push(ValidationError::new(
                codes::STATUS_MISMATCH,
                "overallStatus",
                format!(
                    "overallStatus ({}) does not match computed status ({}).",
                    actual, expected_status
                ),
            ));
        }
    }

    let stored_codes: Vec<&str> = top_codes.iter().filter_map(Value::as_str).collect();
    if unique_in_order(stored_codes.iter().copied()) != unique_in_order(recomputed.codes.iter()) {
        errors.push(ValidationError::new(
            codes::ERROR_CODES_MISMATCH,
            "errorCodes",
            "errorCodes must equal aggregated unique codes from checks[*].errorCodes in stable order.",
        ));
    }

    errors
}

fn validate_check(
    check: &Value,
    index: usize,
    recomputed: &mut Recomputed,
    errors: &mut Vec<ValidationError>,
) {
    let prefix = format!("checks[{}]", index);
    let Some(obj) = check.as_object() else {
        errors.push(ValidationError::new(
            codes::INVALID_CHECK_ENTRY,
            prefix.clone(),
            format!("{} must be an object.", prefix),
        ));
        return;
    };
    let mut entry_error = |name: &str, requirement: &str| {
        let field = format!("{}.{}", prefix, name);
        errors.push(ValidationError::new(
            codes::INVALID_CHECK_ENTRY,
            field.clone(),
            format!("{} must be {}.", field, requirement),
        ));
    };

    for name in ["id", "title", "file"] {
        if non_empty_str(obj.get(name)).is_none() {
            entry_error(name, "a non-empty string");
        }
    }

    let status = parse_status(obj.get("status"));
    if status.is_none() {
        entry_error("status", &format!("one of: {}", allowed_statuses()));
    }
    if obj.get("ok").and_then(Value::as_bool).is_none() {
        entry_error("ok", "a boolean");
    }
    let error_count = non_negative_integer(obj.get("errorCount"));
    if error_count.is_none() {
        entry_error("errorCount", "a non-negative integer");
    }
    let error_codes = obj.get("errorCodes").and_then(Value::as_array);
    if error_codes.is_none() {
        entry_error("errorCodes", "an array");
    }
    if !matches!(obj.get("reason"), None | Some(Value::Null) | Some(Value::String(_))) {
        entry_error("reason", "a string");
    }

    match status {
        Some(CheckStatus::Pass) => recomputed.pass += 1,
        Some(CheckStatus::Fail) => recomputed.fail += 1,
        Some(CheckStatus::Warning) => recomputed.warning += 1,
        None => {}
    }
    recomputed.total_errors += error_count.unwrap_or(0);
    if let Some(list) = error_codes {
        recomputed.codes.extend(
            list.iter()
                .filter_map(Value::as_str)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        );
    }
}
