//! Incident payload: enum membership plus the per-triple source/URL table.

use serde_json::{json, Map, Value};

use qgate_domain::error_codes::ci_incident_payload as codes;
use qgate_domain::schema::{is_recommendation_id, CI_INCIDENT_PAYLOAD_SCHEMA_VERSION};
use qgate_domain::{ArtifactSource, FailureClass, PrimaryArtifactKind, ValidationError};

use super::json::{is_version, parse_object};
use super::{ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::Result;
use crate::incident::{ArtifactTriple, UrlPatterns};
use crate::markdown::labelled_values;

const OPTIONAL_STRING_FIELDS: [&str; 3] = ["workflowRun", "branchPr", "outputFile"];

pub struct CiIncidentPayloadValidator;

impl ArtifactValidator for CiIncidentPayloadValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::CiIncidentPayload
    }

    fn title(&self) -> &'static str {
        "CI incident payload"
    }

    fn default_file(&self) -> Option<&'static str> {
        Some("test-results/ci-incident-payload.json")
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        validate_detailed(&input.content)
    }

    fn extra(&self) -> Vec<(&'static str, Value)> {
        vec![(
            "supportedSchemaVersion",
            json!(CI_INCIDENT_PAYLOAD_SCHEMA_VERSION),
        )]
    }
}

fn allowed<T: AsRef<str>>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn validate_detailed(raw: &str) -> Result<Vec<ValidationError>> {
    let payload = match parse_object(
        raw,
        codes::INVALID_JSON,
        codes::INVALID_PAYLOAD_OBJECT,
        "CI incident",
    ) {
        Ok(payload) => payload,
        Err(e) => return Ok(vec![e]),
    };
    let patterns = UrlPatterns::new()?;
    let mut errors = Vec::new();

    if !is_version(payload.get("schemaVersion"), CI_INCIDENT_PAYLOAD_SCHEMA_VERSION) {
        errors.push(ValidationError::new(
            codes::INVALID_SCHEMA_VERSION,
            "schemaVersion",
            format!("schemaVersion must be {}.", CI_INCIDENT_PAYLOAD_SCHEMA_VERSION),
        ));
    }

    let class = payload
        .get("failureClass")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<FailureClass>().ok());
    if class.is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_FAILURE_CLASS,
            "failureClass",
            format!(
                "failureClass must be one of: {}.",
                allowed(FailureClass::ALL.iter().map(|c| c.as_str()))
            ),
        ));
    }

    match payload.get("recommendationId").and_then(Value::as_str) {
        Some(id) if is_recommendation_id(id) => {
            if let Some(class) = class {
                if id != class.recommendation_id() {
                    errors.push(ValidationError::new(
                        codes::RECOMMENDATION_MISMATCH,
                        "recommendationId",
                        format!(
                            "recommendationId ({}) does not match {} ({}).",
                            id,
                            class,
                            class.recommendation_id()
                        ),
                    ));
                }
            }
        }
        _ => errors.push(ValidationError::new(
            codes::INVALID_RECOMMENDATION_ID,
            "recommendationId",
            "recommendationId must match QG-###.",
        )),
    }

    let primary = payload
        .get("primaryArtifactKind")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<PrimaryArtifactKind>().ok());
    match (primary, class) {
        (None, _) => errors.push(ValidationError::new(
            codes::INVALID_PRIMARY_ARTIFACT_KIND,
            "primaryArtifactKind",
            format!(
                "primaryArtifactKind must be one of: {}.",
                allowed(PrimaryArtifactKind::ALL.iter().map(|k| k.as_str()))
            ),
        )),
        (Some(primary), Some(class)) if primary != class.primary_artifact_kind() => {
            errors.push(ValidationError::new(
                codes::INCONSISTENT_PRIMARY_ARTIFACT_KIND,
                "primaryArtifactKind",
                format!(
                    "primaryArtifactKind ({}) must be {} when failureClass is {}.",
                    primary,
                    class.primary_artifact_kind(),
                    class
                ),
            ))
        }
        _ => {}
    }

    for field in OPTIONAL_STRING_FIELDS {
        if !matches!(payload.get(field), None | Some(Value::String(_))) {
            errors.push(invalid_string(field));
        }
    }

    let markdown = payload
        .get("markdown")
        .and_then(Value::as_str)
        .filter(|md| !md.trim().is_empty());
    if markdown.is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_MARKDOWN,
            "markdown",
            "markdown must be a non-empty string.",
        ));
    }

    for triple in ArtifactTriple::ALL {
        check_triple(&payload, triple, class, markdown, &patterns, &mut errors);
    }

    Ok(errors)
}

fn invalid_string(field: &str) -> ValidationError {
    ValidationError::new(
        codes::INVALID_STRING_FIELD,
        field,
        format!("{} must be a string.", field),
    )
}

fn check_triple(
    payload: &Map<String, Value>,
    triple: ArtifactTriple,
    class: Option<FailureClass>,
    markdown: Option<&str>,
    patterns: &UrlPatterns,
    errors: &mut Vec<ValidationError>,
) {
    let source_field = triple.source_field();
    let url_field = triple.url_field();
    // Only the selective triple predates the optional validator/runtime ones.
    let required = triple == ArtifactTriple::Selective;

    let source = match payload.get(source_field) {
        None if !required => Some(ArtifactSource::NotAvailable),
        value => value
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<ArtifactSource>().ok()),
    };
    if source.is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_ARTIFACT_SOURCE,
            source_field,
            format!(
                "{} must be one of: {}.",
                source_field,
                allowed(ArtifactSource::ALL.iter().map(|s| s.as_str()))
            ),
        ));
    }

    let url = match payload.get(url_field) {
        None if !required => Some(""),
        value => value.and_then(Value::as_str),
    };
    if url.is_none() {
        errors.push(invalid_string(url_field));
    }
    let (Some(source), Some(url)) = (source, url) else {
        return;
    };
    let url = url.trim();

    if let Some(class) = class {
        if source == ArtifactSource::Fallback && class != triple.owner_class() {
            errors.push(ValidationError::new(
                codes::INCONSISTENT_ARTIFACT_SOURCE,
                source_field,
                format!(
                    "{} may be \"fallback\" only when failureClass is {}.",
                    source_field,
                    triple.owner_class()
                ),
            ));
        } else if !triple.applies_to(class) && source != ArtifactSource::NotAvailable {
            errors.push(ValidationError::new(
                codes::INCONSISTENT_ARTIFACT_SOURCE,
                source_field,
                format!(
                    "{} must be \"none\" unless failureClass is {}.",
                    source_field,
                    triple.owner_class()
                ),
            ));
        }
    }

    if source.requires_url() && url.is_empty() {
        errors.push(ValidationError::new(
            codes::INCONSISTENT_ARTIFACT_URL,
            url_field,
            format!("{} must be non-empty when {} is {}.", url_field, source_field, source),
        ));
    } else if !source.requires_url() && !url.is_empty() {
        errors.push(ValidationError::new(
            codes::INCONSISTENT_ARTIFACT_URL,
            url_field,
            format!("{} must be empty when {} is {}.", url_field, source_field, source),
        ));
    } else if source == ArtifactSource::RunId && !patterns.is_run_artifact_url(url) {
        errors.push(ValidationError::new(
            codes::INCONSISTENT_ARTIFACT_URL,
            url_field,
            format!(
                "{} must look like https://github.com/<repo>/actions/runs/<id>/artifacts/<id> when {} is run_id.",
                url_field, source_field
            ),
        ));
    }

    if let Some(markdown) = markdown {
        let lines = labelled_values(markdown, triple.markdown_label());
        let consistent = if url.is_empty() {
            lines.is_empty()
        } else {
            lines == [url]
        };
        if !consistent {
            let expectation = if url.is_empty() {
                format!("be absent when {} is empty", url_field)
            } else {
                format!("appear once and equal {} ({})", url_field, url)
            };
            errors.push(ValidationError::new(
                codes::MARKDOWN_ARTIFACT_MISMATCH,
                "markdown",
                format!(
                    "markdown \"{}\" line must {}.",
                    triple.markdown_label(),
                    expectation
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://github.com/org/repo/actions/runs/1/artifacts/2";

    fn payload() -> Value {
        json!({
            "schemaVersion": 1,
            "failureClass": "selective_contract",
            "recommendationId": "QG-007",
            "workflowRun": "https://github.com/org/repo/actions/runs/1",
            "branchPr": "main",
            "outputFile": "test-results/ci-incident-snippet.md",
            "markdown": format!("### CI Smoke Incident\n\n- Selective decisions artifact: {}\n", URL),
            "artifactUrl": URL,
            "artifactSource": "explicit",
            "validatorArtifactUrl": "",
            "validatorArtifactSource": "none",
            "runtimeArtifactUrl": "",
            "runtimeArtifactSource": "none",
            "primaryArtifactKind": "selective_decisions"
        })
    }

    fn codes_of(value: &Value) -> Vec<String> {
        validate_detailed(&value.to_string())
            .unwrap()
            .into_iter()
            .map(|e| e.code)
            .collect()
    }

    #[test]
    fn test_consistent_selective_payload_passes() {
        assert!(codes_of(&payload()).is_empty());
    }

    #[test]
    fn test_selective_contract_requires_selective_primary_kind() {
        let mut v = payload();
        v["primaryArtifactKind"] = json!("none");
        assert_eq!(codes_of(&v), vec![codes::INCONSISTENT_PRIMARY_ARTIFACT_KIND]);
    }

    #[test]
    fn test_fallback_only_for_owner_class() {
        let mut v = payload();
        v["validatorArtifactSource"] = json!("fallback");
        assert_eq!(codes_of(&v), vec![codes::INCONSISTENT_ARTIFACT_SOURCE]);
    }

    #[test]
    fn test_runtime_triple_must_be_none_outside_config_contract() {
        let mut v = payload();
        v["runtimeArtifactSource"] = json!("explicit");
        v["runtimeArtifactUrl"] = json!("https://example.com/r");
        let found = codes_of(&v);
        assert!(found.contains(&codes::INCONSISTENT_ARTIFACT_SOURCE.to_string()));
        assert!(found.contains(&codes::MARKDOWN_ARTIFACT_MISMATCH.to_string()));
    }

    #[test]
    fn test_url_presence_follows_source() {
        let mut v = payload();
        v["artifactUrl"] = json!("");
        let found = codes_of(&v);
        assert!(found.contains(&codes::INCONSISTENT_ARTIFACT_URL.to_string()));

        let mut v = payload();
        v["artifactSource"] = json!("none");
        let found = codes_of(&v);
        assert!(found.contains(&codes::INCONSISTENT_ARTIFACT_URL.to_string()));
    }

    #[test]
    fn test_run_id_url_shape() {
        let mut v = payload();
        v["artifactSource"] = json!("run_id");
        assert!(codes_of(&v).is_empty());

        v["artifactUrl"] = json!("https://example.com/artifact");
        v["markdown"] = json!("### CI Smoke Incident\n- Selective decisions artifact: https://example.com/artifact\n");
        assert_eq!(codes_of(&v), vec![codes::INCONSISTENT_ARTIFACT_URL]);
    }

    #[test]
    fn test_markdown_line_must_match_url() {
        let mut v = payload();
        v["markdown"] = json!("### CI Smoke Incident\n- Selective decisions artifact: https://other\n");
        assert_eq!(codes_of(&v), vec![codes::MARKDOWN_ARTIFACT_MISMATCH]);
    }

    #[test]
    fn test_recommendation_and_enums() {
        let mut v = payload();
        v["recommendationId"] = json!("QG-001");
        assert_eq!(codes_of(&v), vec![codes::RECOMMENDATION_MISMATCH]);

        let mut v = payload();
        v["recommendationId"] = json!("QG-7");
        v["workflowRun"] = json!(5);
        let found = codes_of(&v);
        assert!(found.contains(&codes::INVALID_RECOMMENDATION_ID.to_string()));
        assert!(found.contains(&codes::INVALID_STRING_FIELD.to_string()));
    }

    #[test]
    fn test_optional_triples_default_to_none() {
        let mut v = payload();
        let obj = v.as_object_mut().unwrap();
        for key in [
            "validatorArtifactUrl",
            "validatorArtifactSource",
            "runtimeArtifactUrl",
            "runtimeArtifactSource",
        ] {
            obj.remove(key);
        }
        assert!(codes_of(&v).is_empty());
    }
}
