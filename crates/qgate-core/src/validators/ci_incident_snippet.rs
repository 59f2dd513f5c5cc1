//! Markdown incident snippet written by the publisher.

use chrono::DateTime;

use qgate_domain::error_codes::ci_incident_snippet as codes;
use qgate_domain::schema::is_recommendation_id;
use qgate_domain::{FailureClass, ValidationError};

use super::{ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::Result;
use crate::incident::{
    ArtifactTriple, DETECTED_LABEL, FAILURE_CLASS_LABEL, INCIDENT_HEADING, RECOMMENDATION_LABEL,
    SNIPPET_FIELDS,
};
use crate::markdown::labelled_values;

pub struct CiIncidentSnippetValidator;

impl ArtifactValidator for CiIncidentSnippetValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::CiIncidentSnippet
    }

    fn title(&self) -> &'static str {
        "CI incident snippet"
    }

    fn default_file(&self) -> Option<&'static str> {
        Some("test-results/ci-incident-snippet.md")
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        Ok(validate_detailed(&input.content))
    }
}

/// The single value of `label`, reporting missing or repeated lines.
fn single_value<'a>(
    markdown: &'a str,
    label: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<&'a str> {
    let values = labelled_values(markdown, label);
    match values.as_slice() {
        [value] => Some(*value),
        [] => {
            errors.push(ValidationError::new(
                codes::MISSING_FIELD,
                label,
                format!("Missing \"- {}:\" line.", label),
            ));
            None
        }
        _ => {
            errors.push(ValidationError::new(
                codes::DUPLICATE_FIELD,
                label,
                format!(
                    "\"- {}:\" appears {} times; expected exactly once.",
                    label,
                    values.len()
                ),
            ));
            None
        }
    }
}

pub fn validate_detailed(markdown: &str) -> Vec<ValidationError> {
    let Some(first_line) = markdown.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return vec![ValidationError::new(
            codes::EMPTY,
            "markdown",
            "Incident snippet is empty.",
        )];
    };
    let mut errors = Vec::new();

    if first_line != INCIDENT_HEADING {
        errors.push(ValidationError::new(
            codes::MISSING_HEADING,
            "heading",
            format!("First line must be \"{}\".", INCIDENT_HEADING),
        ));
    }

    let mut class = None;
    let mut recommendation = None;
    for label in SNIPPET_FIELDS {
        let Some(value) = single_value(markdown, label, &mut errors) else {
            continue;
        };
        match label {
            DETECTED_LABEL => {
                if DateTime::parse_from_rfc3339(value).is_err() {
                    errors.push(ValidationError::new(
                        codes::INVALID_TIMESTAMP,
                        label,
                        format!("{} must be an RFC 3339 timestamp, got \"{}\".", label, value),
                    ));
                }
            }
            FAILURE_CLASS_LABEL => match value.parse::<FailureClass>() {
                Ok(parsed) => class = Some(parsed),
                Err(_) => errors.push(ValidationError::new(
                    codes::INVALID_FAILURE_CLASS,
                    label,
                    format!("Unknown failure class \"{}\".", value),
                )),
            },
            RECOMMENDATION_LABEL => {
                if is_recommendation_id(value) {
                    recommendation = Some(value);
                } else {
                    errors.push(ValidationError::new(
                        codes::INVALID_RECOMMENDATION_ID,
                        label,
                        format!("{} must match QG-###, got \"{}\".", label, value),
                    ));
                }
            }
            _ => {}
        }
    }

    if let (Some(class), Some(id)) = (class, recommendation) {
        if id != class.recommendation_id() {
            errors.push(ValidationError::new(
                codes::RECOMMENDATION_MISMATCH,
                RECOMMENDATION_LABEL,
                format!(
                    "{} ({}) does not match failure class {} ({}).",
                    RECOMMENDATION_LABEL,
                    id,
                    class,
                    class.recommendation_id()
                ),
            ));
        }
    }

    for triple in ArtifactTriple::ALL {
        let label = triple.markdown_label();
        for value in labelled_values(markdown, label) {
            let is_url = ["https://", "http://"]
                .iter()
                .any(|scheme| value.len() > scheme.len() && value.starts_with(scheme));
            if !is_url {
                errors.push(ValidationError::new(
                    codes::INVALID_ARTIFACT_LINE,
                    label,
                    format!("{} must be an http(s) URL, got \"{}\".", label, value),
                ));
            }
        }
    }

    errors
}
