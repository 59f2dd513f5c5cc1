//! Collected selective decisions aggregate.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use qgate_domain::error_codes::selective_decisions as codes;
use qgate_domain::schema::SELECTIVE_DECISIONS_SCHEMA_VERSION;
use qgate_domain::ValidationError;

use super::json::{is_version, non_empty_str, parse_object, string_array};
use super::{selective_decision, ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::Result;

pub struct SelectiveDecisionsValidator;

impl ArtifactValidator for SelectiveDecisionsValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::SelectiveDecisions
    }

    fn title(&self) -> &'static str {
        "Selective decisions"
    }

    fn default_file(&self) -> Option<&'static str> {
        Some("test-results/selective-decisions.json")
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        Ok(validate_detailed(&input.content))
    }

    fn extra(&self) -> Vec<(&'static str, Value)> {
        vec![(
            "supportedSchemaVersion",
            json!(SELECTIVE_DECISIONS_SCHEMA_VERSION),
        )]
    }
}

pub fn validate_detailed(raw: &str) -> Vec<ValidationError> {
    let payload = match parse_object(
        raw,
        codes::INVALID_JSON,
        codes::INVALID_PAYLOAD_OBJECT,
        "Selective decisions",
    ) {
        Ok(payload) => payload,
        Err(e) => return vec![e],
    };
    let mut errors = Vec::new();

    if !is_version(payload.get("schemaVersion"), SELECTIVE_DECISIONS_SCHEMA_VERSION) {
        errors.push(ValidationError::new(
            codes::INVALID_SCHEMA_VERSION,
            "schemaVersion",
            format!("schemaVersion must be {}.", SELECTIVE_DECISIONS_SCHEMA_VERSION),
        ));
    }

    match payload.get("decisions").and_then(Value::as_array) {
        None => errors.push(ValidationError::new(
            codes::INVALID_DECISIONS_ARRAY,
            "decisions",
            "decisions must be an array.",
        )),
        Some(decisions) => {
            let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
            for (index, decision) in decisions.iter().enumerate() {
                let prefix = format!("decisions[{}]", index);
                for inner in selective_decision::validate_value(decision, &prefix) {
                    errors.push(ValidationError::new(
                        codes::INVALID_DECISION_ENTRY,
                        inner.field,
                        inner.message,
                    ));
                }
                if let Some(check) = non_empty_str(decision.get("check")) {
                    if let Some(first) = first_seen.get(check) {
                        errors.push(ValidationError::new(
                            codes::DUPLICATE_CHECK,
                            format!("{}.check", prefix),
                            format!(
                                "Check \"{}\" appears more than once (decisions[{}] and {}).",
                                check, first, prefix
                            ),
                        ));
                    } else {
                        first_seen.insert(check, index);
                    }
                }
            }
        }
    }

    if string_array(payload.get("warnings")).is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_WARNINGS_ARRAY,
            "warnings",
            "warnings must be an array of strings.",
        ));
    }

    errors
}
