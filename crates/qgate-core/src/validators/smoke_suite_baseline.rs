//! Smoke-suite baseline recommendation written by the quality gate.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use qgate_domain::error_codes::smoke_suite_baseline as codes;
use qgate_domain::schema::SMOKE_SUITE_BASELINE_SCHEMA_VERSION;
use qgate_domain::ValidationError;

use super::json::{is_version, parse_object, string_array};
use super::{ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::Result;

const LIST_FIELDS: [&str; 4] = ["currentFiles", "baselineFiles", "addedFiles", "removedFiles"];

pub struct SmokeSuiteBaselineValidator;

impl ArtifactValidator for SmokeSuiteBaselineValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::SmokeSuiteBaseline
    }

    fn title(&self) -> &'static str {
        "Smoke suite baseline recommendation"
    }

    fn default_file(&self) -> Option<&'static str> {
        Some("test-results/smoke-suite-baseline-recommendation.json")
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        Ok(validate_detailed(&input.content))
    }

    fn extra(&self) -> Vec<(&'static str, Value)> {
        vec![(
            "supportedSchemaVersion",
            json!(SMOKE_SUITE_BASELINE_SCHEMA_VERSION),
        )]
    }
}

fn is_strictly_sorted(list: &[&str]) -> bool {
    list.windows(2).all(|pair| pair[0] < pair[1])
}

pub fn validate_detailed(raw: &str) -> Vec<ValidationError> {
    let payload = match parse_object(
        raw,
        codes::INVALID_JSON,
        codes::INVALID_PAYLOAD_OBJECT,
        "Smoke suite baseline recommendation",
    ) {
        Ok(payload) => payload,
        Err(e) => return vec![e],
    };
    let mut errors = Vec::new();

    if !is_version(payload.get("schemaVersion"), SMOKE_SUITE_BASELINE_SCHEMA_VERSION) {
        errors.push(ValidationError::new(
            codes::INVALID_SCHEMA_VERSION,
            "schemaVersion",
            format!("schemaVersion must be {}.", SMOKE_SUITE_BASELINE_SCHEMA_VERSION),
        ));
    }

    let mut lists = Vec::with_capacity(LIST_FIELDS.len());
    for field in LIST_FIELDS {
        let list = string_array(payload.get(field));
        match &list {
            None => errors.push(ValidationError::new(
                codes::INVALID_FILE_LIST,
                field,
                format!("{} must be an array of strings.", field),
            )),
            Some(list) if !is_strictly_sorted(list) => errors.push(ValidationError::new(
                codes::UNSORTED_FILE_LIST,
                field,
                format!("{} must be sorted and free of duplicates.", field),
            )),
            Some(_) => {}
        }
        lists.push(list);
    }

    let changed = payload.get("changed").and_then(Value::as_bool);
    if changed.is_none() {
        errors.push(ValidationError::new(
            codes::CHANGED_FLAG_MISMATCH,
            "changed",
            "changed must be a boolean.",
        ));
    }

    let (Some(current), Some(baseline)) = (&lists[0], &lists[1]) else {
        return errors;
    };
    let current_set: BTreeSet<&str> = current.iter().copied().collect();
    let baseline_set: BTreeSet<&str> = baseline.iter().copied().collect();
    let added: Vec<&str> = current_set.difference(&baseline_set).copied().collect();
    let removed: Vec<&str> = baseline_set.difference(&current_set).copied().collect();

    let drift = [
        (2, &added, "currentFiles - baselineFiles"),
        (3, &removed, "baselineFiles - currentFiles"),
    ];
    for (index, expected, label) in drift {
        if let Some(stored) = &lists[index] {
            if stored != expected {
                errors.push(ValidationError::new(
                    codes::DRIFT_MISMATCH,
                    LIST_FIELDS[index],
                    format!("{} must equal {}.", LIST_FIELDS[index], label),
                ));
            }
        }
    }

    let expected_changed = !added.is_empty() || !removed.is_empty();
    if let Some(changed) = changed {
        if changed != expected_changed {
            errors.push(ValidationError::new(
                codes::CHANGED_FLAG_MISMATCH,
                "changed",
                format!(
                    "changed ({}) does not match computed drift ({}).",
                    changed, expected_changed
                ),
            ));
        }
    }

    let expected_baseline = current.join(",");
    let recommended = payload.get("recommendedBaseline").and_then(Value::as_str);
    if recommended != Some(expected_baseline.as_str()) {
        errors.push(ValidationError::new(
            codes::RECOMMENDED_BASELINE_MISMATCH,
            "recommendedBaseline",
            "recommendedBaseline must be currentFiles joined by \",\".",
        ));
    }

    errors
}
