//! CI exception block in a pull-request description.
//!
//! An exception is requested with a `- [x] CI exception requested` checkbox.
//! Once checked, every labelled field must carry a concrete value. When the
//! caller sets `REQUIRE_EXCEPTION` (an upstream gate failed) the checkbox
//! itself becomes mandatory.

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use qgate_domain::error_codes::pr_ci_exception as codes;
use qgate_domain::ValidationError;

use super::{ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::{QgateError, Result};
use crate::io;

pub const REQUIRE_EXCEPTION_VAR: &str = "REQUIRE_EXCEPTION";
pub const PR_BODY_VAR: &str = "PR_BODY";
pub const EVENT_PATH_VAR: &str = "GITHUB_EVENT_PATH";

const EXPIRES_LABEL: &str = "Expires";

/// Labelled lines required once the exception is requested.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "Exception reason",
    "Failed gate",
    "Owner",
    "Follow-up issue",
    EXPIRES_LABEL,
];

const PLACEHOLDERS: [&str; 6] = ["tbd", "n/a", "-", "none", "todo", "..."];

pub struct PrCiExceptionValidator;

impl ArtifactValidator for PrCiExceptionValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::PrCiException
    }

    fn title(&self) -> &'static str {
        "PR CI exception"
    }

    fn default_file(&self) -> Option<&'static str> {
        None
    }

    /// `--file` event JSON, else `PR_BODY`, else the event at `GITHUB_EVENT_PATH`.
    fn load_input(&self, env: &EnvSnapshot, file: Option<&str>) -> Result<ValidatorInput> {
        let event_file = match (file, env.var(PR_BODY_VAR)) {
            (Some(file), _) => Some(file),
            (None, Some(body)) => {
                return Ok(ValidatorInput {
                    file: None,
                    content: body.to_string(),
                });
            }
            (None, None) => env.var(EVENT_PATH_VAR),
        };
        let Some(event_file) = event_file else {
            return Ok(ValidatorInput {
                file: None,
                content: String::new(),
            });
        };
        let raw = io::read_text(&env.resolve(event_file))?;
        Ok(ValidatorInput {
            file: Some(event_file.to_string()),
            content: body_from_event(&raw, event_file)?,
        })
    }

    fn validate(&self, env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        validate_detailed(&input.content, env.flag(REQUIRE_EXCEPTION_VAR))
    }
}

/// `.pull_request.body` of a pull-request event; a null body is empty.
pub fn body_from_event(raw: &str, what: &str) -> Result<String> {
    let event: Value = serde_json::from_str(raw).map_err(|source| QgateError::Parse {
        what: format!("pull request event {}", what),
        source,
    })?;
    Ok(event
        .pointer("/pull_request/body")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    let lowered = value.to_ascii_lowercase();
    value.is_empty()
        || PLACEHOLDERS.contains(&lowered.as_str())
        || (value.starts_with('<') && value.ends_with('>'))
        || (value.starts_with('[') && value.ends_with(']'))
}

fn field_pattern(label: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(&format!(
        r"^\s*(?:[-*]\s+)?(?:\*\*)?{}(?:\*\*)?\s*:(?:\*\*)?(.*)$",
        regex::escape(label)
    ))
    .case_insensitive(true)
    .multi_line(true)
    .build()?)
}

pub fn validate_detailed(body: &str, exception_required: bool) -> Result<Vec<ValidationError>> {
    if body.trim().is_empty() {
        return Ok(if exception_required {
            vec![ValidationError::new(
                codes::EMPTY_BODY,
                "body",
                "Pull request body is empty but a CI exception is required.",
            )]
        } else {
            Vec::new()
        });
    }

    let checkbox = RegexBuilder::new(r"^\s*[-*]\s+\[[xX]\]\s+CI exception requested")
        .case_insensitive(true)
        .multi_line(true)
        .build()?;
    if !checkbox.is_match(body) {
        return Ok(if exception_required {
            vec![ValidationError::new(
                codes::EXCEPTION_NOT_REQUESTED,
                "checkbox",
                "A quality gate failed: check \"- [x] CI exception requested\" and fill in the exception fields, or fix the failure.",
            )]
        } else {
            Vec::new()
        });
    }

    let mut errors = Vec::new();
    for label in REQUIRED_FIELDS {
        let pattern = field_pattern(label)?;
        let value = pattern
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim());
        let Some(value) = value else {
            errors.push(ValidationError::new(
                codes::MISSING_FIELD,
                label,
                format!("Missing \"{}:\" line in the CI exception block.", label),
            ));
            continue;
        };
        if is_placeholder(value) {
            errors.push(ValidationError::new(
                codes::PLACEHOLDER_VALUE,
                label,
                format!("{} must be a concrete value, got \"{}\".", label, value),
            ));
        } else if label == EXPIRES_LABEL && !is_expiry_date(value) {
            errors.push(ValidationError::new(
                codes::INVALID_EXPIRY,
                label,
                format!("{} must be a YYYY-MM-DD date, got \"{}\".", label, value),
            ));
        }
    }
    Ok(errors)
}

fn is_expiry_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = "## Summary\n\nFix.\n\n- [x] CI exception requested\n- Exception reason: flaky upstream sandbox\n- Failed gate: smoke\n- Owner: @qa\n- Follow-up issue: #123\n- Expires: 2026-12-31\n";

    fn codes_of(body: &str, required: bool) -> Vec<String> {
        validate_detailed(body, required)
            .unwrap()
            .into_iter()
            .map(|e| e.code)
            .collect()
    }

    #[test]
    fn test_complete_exception_passes() {
        assert!(codes_of(COMPLETE, true).is_empty());
    }

    #[test]
    fn test_nothing_required_nothing_requested() {
        assert!(codes_of("", false).is_empty());
        assert!(codes_of("Plain PR", false).is_empty());
        assert_eq!(codes_of("", true), vec![codes::EMPTY_BODY]);
        assert_eq!(
            codes_of("- [ ] CI exception requested", true),
            vec![codes::EXCEPTION_NOT_REQUESTED]
        );
    }

    #[test]
    fn test_placeholders_are_rejected() {
        for placeholder in ["TBD", "n/a", "-", "None", "todo", "<owner>", "[issue]", ""] {
            let body = COMPLETE.replace("@qa", placeholder);
            assert_eq!(
                codes_of(&body, false),
                vec![codes::PLACEHOLDER_VALUE],
                "{:?}",
                placeholder
            );
        }
    }

    #[test]
    fn test_missing_field_and_bad_expiry() {
        let body = COMPLETE.replace("- Failed gate: smoke\n", "");
        assert_eq!(codes_of(&body, false), vec![codes::MISSING_FIELD]);
        let body = COMPLETE.replace("2026-12-31", "2026-02-30");
        assert_eq!(codes_of(&body, false), vec![codes::INVALID_EXPIRY]);
        let body = COMPLETE.replace("2026-12-31", "next week");
        assert_eq!(codes_of(&body, false), vec![codes::INVALID_EXPIRY]);
    }

    #[test]
    fn test_bold_labels_are_accepted() {
        let body = COMPLETE.replace("- Owner: @qa", "- **Owner:** @qa");
        assert!(codes_of(&body, false).is_empty());
    }

    #[test]
    fn test_body_comes_from_event_json() {
        let raw = r#"{"pull_request": {"body": "- [x] CI exception requested"}}"#;
        assert_eq!(
            body_from_event(raw, "event.json").unwrap(),
            "- [x] CI exception requested"
        );
        assert_eq!(
            body_from_event(r#"{"pull_request": {"body": null}}"#, "e").unwrap(),
            ""
        );
        assert!(body_from_event("{", "e").is_err());
    }

    #[test]
    fn test_pr_body_env_is_used_without_file() {
        let env = EnvSnapshot::new([(PR_BODY_VAR, COMPLETE)], "/tmp");
        let input = PrCiExceptionValidator.load_input(&env, None).unwrap();
        assert!(input.file.is_none());
        assert!(input.content.contains("CI exception requested"));
    }
}
