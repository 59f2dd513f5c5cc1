//! Quality snapshot written by the quality gate.

use serde_json::{json, Map, Value};

use qgate_domain::error_codes::quality_summary as codes;
use qgate_domain::schema::QUALITY_SNAPSHOT_SCHEMA_VERSION;
use qgate_domain::{FailureClass, ValidationError};

use super::json::{finite_number, is_version, non_empty_str, parse_object, string_array};
use super::{selective_decision, ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::Result;

const REQUIRED_STRING_FIELDS: [&str; 2] = ["lintJobResult", "smokeJobResult"];
const REQUIRED_BOOLEAN_FIELDS: [&str; 5] = [
    "overallOk",
    "lintOk",
    "smokeOk",
    "smokeDurationOverBudget",
    "budgetBlocking",
];
const REQUIRED_NUMBER_FIELDS: [&str; 2] = ["smokeDurationSeconds", "smokeDurationBudgetSeconds"];

const OPTIONAL_STRING_ARRAYS: [&str; 6] = [
    "smokeSuiteFiles",
    "smokeSuiteAddedFiles",
    "smokeSuiteRemovedFiles",
    "selectiveDecisionWarnings",
    "runtimeConfigDiagnosticsWarnings",
    "validatorContractsSummaryValidationWarnings",
];
const OPTIONAL_BOOLEANS: [&str; 4] = [
    "smokeSuiteBaselineProvided",
    "selectiveDecisionsAggregateIssue",
    "runtimeConfigDiagnosticsIssue",
    "validatorContractsSummaryValidationIssue",
];
const OPTIONAL_NULLABLE_BOOLEANS: [&str; 2] = [
    "runtimeConfigDiagnosticsOk",
    "validatorContractsSummaryValidationOk",
];

pub struct QualitySummaryValidator;

impl ArtifactValidator for QualitySummaryValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::QualitySummary
    }

    fn title(&self) -> &'static str {
        "Quality summary"
    }

    fn default_file(&self) -> Option<&'static str> {
        Some("test-results/quality-summary.json")
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        Ok(validate_detailed(&input.content))
    }

    fn extra(&self) -> Vec<(&'static str, Value)> {
        vec![(
            "supportedSchemaVersion",
            json!(QUALITY_SNAPSHOT_SCHEMA_VERSION),
        )]
    }
}

fn known_fields() -> Vec<&'static str> {
    let mut fields = vec![
        "schemaVersion",
        "failureClass",
        "recommendationId",
        "inconsistencies",
        "selectiveDecisions",
    ];
    fields.extend(REQUIRED_STRING_FIELDS);
    fields.extend(REQUIRED_BOOLEAN_FIELDS);
    fields.extend(REQUIRED_NUMBER_FIELDS);
    fields.extend(OPTIONAL_STRING_ARRAYS);
    fields.extend(OPTIONAL_BOOLEANS);
    fields.extend(OPTIONAL_NULLABLE_BOOLEANS);
    fields
}

fn missing(field: &str, requirement: &str) -> ValidationError {
    ValidationError::new(
        codes::MISSING_FIELD,
        field,
        format!("Field \"{}\" is required ({}).", field, requirement),
    )
}

fn invalid(field: &str, requirement: &str) -> ValidationError {
    ValidationError::new(
        codes::INVALID_FIELD,
        field,
        format!("Field \"{}\" must be {}.", field, requirement),
    )
}

/// Presence and type of one required field.
fn check_required(
    payload: &Map<String, Value>,
    field: &str,
    requirement: &str,
    valid: impl Fn(&Value) -> bool,
    errors: &mut Vec<ValidationError>,
) {
    match payload.get(field) {
        None => errors.push(missing(field, requirement)),
        Some(value) if !valid(value) => errors.push(invalid(field, requirement)),
        Some(_) => {}
    }
}

fn check_optional(
    payload: &Map<String, Value>,
    field: &str,
    requirement: &str,
    valid: impl Fn(&Value) -> bool,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(value) = payload.get(field) {
        if !valid(value) {
            errors.push(invalid(field, requirement));
        }
    }
}

pub fn validate_detailed(raw: &str) -> Vec<ValidationError> {
    let payload = match parse_object(
        raw,
        codes::INVALID_JSON,
        codes::INVALID_PAYLOAD_OBJECT,
        "Quality summary",
    ) {
        Ok(payload) => payload,
        Err(e) => return vec![e],
    };
    let mut errors = Vec::new();

    if !is_version(payload.get("schemaVersion"), QUALITY_SNAPSHOT_SCHEMA_VERSION) {
        errors.push(ValidationError::new(
            codes::INVALID_SCHEMA_VERSION,
            "schemaVersion",
            format!("schemaVersion must be {}.", QUALITY_SNAPSHOT_SCHEMA_VERSION),
        ));
    }

    for field in REQUIRED_STRING_FIELDS {
        check_required(
            &payload,
            field,
            "a non-empty string",
            |v| non_empty_str(Some(v)).is_some(),
            &mut errors,
        );
    }
    for field in REQUIRED_BOOLEAN_FIELDS {
        check_required(&payload, field, "a boolean", Value::is_boolean, &mut errors);
    }
    for field in REQUIRED_NUMBER_FIELDS {
        check_required(
            &payload,
            field,
            "a finite number",
            |v| finite_number(Some(v)).is_some(),
            &mut errors,
        );
    }
    check_required(
        &payload,
        "recommendationId",
        "string or null",
        |v| v.is_null() || v.is_string(),
        &mut errors,
    );
    check_required(
        &payload,
        "inconsistencies",
        "an array of strings",
        |v| string_array(Some(v)).is_some(),
        &mut errors,
    );

    for field in OPTIONAL_STRING_ARRAYS {
        check_optional(
            &payload,
            field,
            "an array of strings",
            |v| string_array(Some(v)).is_some(),
            &mut errors,
        );
    }
    for field in OPTIONAL_BOOLEANS {
        check_optional(&payload, field, "a boolean", Value::is_boolean, &mut errors);
    }
    for field in OPTIONAL_NULLABLE_BOOLEANS {
        check_optional(
            &payload,
            field,
            "boolean or null",
            |v| v.is_boolean() || v.is_null(),
            &mut errors,
        );
    }

    match payload.get("selectiveDecisions") {
        None => {}
        Some(Value::Array(decisions)) => {
            for (index, decision) in decisions.iter().enumerate() {
                let prefix = format!("selectiveDecisions[{}]", index);
                for inner in selective_decision::validate_value(decision, &prefix) {
                    errors.push(ValidationError::new(
                        codes::INVALID_FIELD,
                        inner.field,
                        inner.message,
                    ));
                }
            }
        }
        Some(_) => errors.push(invalid("selectiveDecisions", "an array")),
    }

    check_classification(&payload, &mut errors);

    let known = known_fields();
    let unexpected: Vec<&str> = payload
        .keys()
        .map(String::as_str)
        .filter(|key| !known.contains(key))
        .collect();
    if !unexpected.is_empty() {
        errors.push(ValidationError::new(
            codes::UNEXPECTED_FIELD,
            "payload",
            format!("Unexpected fields present: {}", unexpected.join(", ")),
        ));
    }

    errors
}

/// `overallOk` ⇔ no failure class; recommendation equals the mapped id.
fn check_classification(payload: &Map<String, Value>, errors: &mut Vec<ValidationError>) {
    let class = match payload.get("failureClass") {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_str().and_then(|s| s.parse::<FailureClass>().ok()) {
            Some(class) => Some(class),
            None => {
                errors.push(invalid("failureClass", "a known failure class"));
                return;
            }
        },
    };
    let Some(overall_ok) = payload.get("overallOk").and_then(Value::as_bool) else {
        return;
    };
    let recommendation = payload.get("recommendationId");

    match (overall_ok, class) {
        (true, Some(class)) => errors.push(ValidationError::new(
            codes::FAILURE_CLASS_MISMATCH,
            "failureClass",
            format!("failureClass ({}) must be absent when overallOk is true.", class),
        )),
        (false, None) => errors.push(ValidationError::new(
            codes::FAILURE_CLASS_MISMATCH,
            "failureClass",
            "failureClass is required when overallOk is false.",
        )),
        (true, None) => {
            if matches!(recommendation, Some(Value::String(_))) {
                errors.push(ValidationError::new(
                    codes::RECOMMENDATION_MISMATCH,
                    "recommendationId",
                    "recommendationId must be null when overallOk is true.",
                ));
            }
        }
        (false, Some(class)) => {
            let expected = class.recommendation_id();
            if recommendation.and_then(Value::as_str) != Some(expected) {
                errors.push(ValidationError::new(
                    codes::RECOMMENDATION_MISMATCH,
                    "recommendationId",
                    format!("recommendationId must be {} for {}.", expected, class),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> Value {
        json!({
            "schemaVersion": 1,
            "overallOk": true,
            "recommendationId": null,
            "lintOk": true,
            "smokeOk": true,
            "lintJobResult": "success",
            "smokeJobResult": "success",
            "smokeDurationSeconds": 4.2,
            "smokeDurationBudgetSeconds": 0,
            "smokeDurationOverBudget": false,
            "budgetBlocking": false,
            "inconsistencies": [],
            "smokeSuiteFiles": ["__tests__/a.test.ts"],
            "selectiveDecisions": [],
            "runtimeConfigDiagnosticsOk": null
        })
    }

    fn codes_of(value: &Value) -> Vec<String> {
        validate_detailed(&value.to_string())
            .into_iter()
            .map(|e| e.code)
            .collect()
    }

    #[test]
    fn test_healthy_snapshot_passes() {
        assert!(codes_of(&healthy()).is_empty());
    }

    #[test]
    fn test_failing_snapshot_needs_class_and_mapped_id() {
        let mut v = healthy();
        v["overallOk"] = json!(false);
        assert_eq!(codes_of(&v), vec![codes::FAILURE_CLASS_MISMATCH]);

        v["failureClass"] = json!("smoke_only");
        v["recommendationId"] = json!("QG-003");
        assert_eq!(codes_of(&v), vec![codes::RECOMMENDATION_MISMATCH]);

        v["recommendationId"] = json!("QG-004");
        assert!(codes_of(&v).is_empty());
    }

    #[test]
    fn test_healthy_snapshot_rejects_class() {
        let mut v = healthy();
        v["failureClass"] = json!("mixed");
        assert_eq!(codes_of(&v), vec![codes::FAILURE_CLASS_MISMATCH]);
    }

    #[test]
    fn test_required_and_typed_fields() {
        let mut v = healthy();
        v.as_object_mut().unwrap().remove("inconsistencies");
        v["lintOk"] = json!("yes");
        v["runtimeConfigDiagnosticsOk"] = json!("ok");
        let found = codes_of(&v);
        assert_eq!(
            found,
            vec![codes::INVALID_FIELD, codes::MISSING_FIELD, codes::INVALID_FIELD]
        );
    }

    #[test]
    fn test_embedded_decisions_and_unexpected_fields() {
        let mut v = healthy();
        v["selectiveDecisions"] = json!([{"contractVersion": 1}]);
        v["extra"] = json!(1);
        let errors = validate_detailed(&v.to_string());
        assert!(errors
            .iter()
            .any(|e| e.code == codes::INVALID_FIELD && e.field == "selectiveDecisions[0].check"));
        let last = errors.last().unwrap();
        assert_eq!(last.code, codes::UNEXPECTED_FIELD);
        assert_eq!(last.message, "Unexpected fields present: extra");
    }
}
