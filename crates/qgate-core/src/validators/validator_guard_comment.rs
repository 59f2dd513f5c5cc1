//! PR comment posted by the validator contracts guard.

use regex::Regex;

use qgate_domain::error_codes::validator_guard_comment as codes;
use qgate_domain::{CheckStatus, ValidationError};

use super::{ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::Result;
use crate::markdown::{count_exact_lines, labelled_values};

/// Hidden marker used to find and update the comment in place.
pub const GUARD_MARKER: &str = "<!-- qgate:validator-guard -->";
pub const GUARD_HEADING: &str = "### Validator Contracts Guard";

const CHECKS_PATTERN: &str = r"^(\d+) \(pass (\d+), fail (\d+), warning (\d+)\)$";

pub struct ValidatorGuardCommentValidator;

impl ArtifactValidator for ValidatorGuardCommentValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::ValidatorGuardComment
    }

    fn title(&self) -> &'static str {
        "Validator guard comment"
    }

    fn default_file(&self) -> Option<&'static str> {
        Some("test-results/validator-guard-comment.md")
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        validate_detailed(&input.content)
    }
}

struct Counts {
    total: usize,
    pass: usize,
    fail: usize,
    warning: usize,
}

fn parse_counts(pattern: &Regex, value: &str) -> Option<Counts> {
    let caps = pattern.captures(value)?;
    let n = |i: usize| caps.get(i)?.as_str().parse::<usize>().ok();
    Some(Counts {
        total: n(1)?,
        pass: n(2)?,
        fail: n(3)?,
        warning: n(4)?,
    })
}

pub fn validate_detailed(comment: &str) -> Result<Vec<ValidationError>> {
    if comment.trim().is_empty() {
        return Ok(vec![ValidationError::new(
            codes::EMPTY,
            "comment",
            "Validator guard comment is empty.",
        )]);
    }
    let pattern = Regex::new(CHECKS_PATTERN)?;
    let mut errors = Vec::new();

    let markers = comment.matches(GUARD_MARKER).count();
    if markers == 0 {
        errors.push(ValidationError::new(
            codes::MISSING_MARKER,
            "marker",
            format!("Comment must contain the marker {}.", GUARD_MARKER),
        ));
    } else if markers > 1 {
        errors.push(ValidationError::new(
            codes::DUPLICATE_MARKER,
            "marker",
            format!("Marker {} appears {} times; expected once.", GUARD_MARKER, markers),
        ));
    }

    if count_exact_lines(comment, GUARD_HEADING) == 0 {
        errors.push(ValidationError::new(
            codes::MISSING_HEADING,
            "heading",
            format!("Comment must contain the heading \"{}\".", GUARD_HEADING),
        ));
    }

    let status = match labelled_values(comment, "Status").as_slice() {
        [value] => value.parse::<CheckStatus>().ok(),
        _ => None,
    };
    if status.is_none() {
        errors.push(ValidationError::new(
            codes::INVALID_STATUS,
            "status",
            "Comment must contain one \"- Status: pass|fail|warning\" line.",
        ));
    }

    let counts = match labelled_values(comment, "Checks").as_slice() {
        [value] => parse_counts(&pattern, value),
        _ => None,
    };
    let Some(counts) = counts else {
        errors.push(ValidationError::new(
            codes::INVALID_COUNTS,
            "checks",
            "Comment must contain one \"- Checks: N (pass P, fail F, warning W)\" line.",
        ));
        return Ok(errors);
    };

    if counts.pass + counts.fail + counts.warning != counts.total {
        errors.push(ValidationError::new(
            codes::COUNT_MISMATCH,
            "checks",
            format!(
                "pass ({}) + fail ({}) + warning ({}) does not equal total checks ({}).",
                counts.pass, counts.fail, counts.warning, counts.total
            ),
        ));
    }
    let expected = CheckStatus::from_counts(counts.fail, counts.warning);
    if let Some(status) = status {
        if status != expected {
            errors.push(ValidationError::new(
                codes::STATUS_MISMATCH,
                "status",
                format!(
                    "Status ({}) does not match the counts (expected {}).",
                    status, expected
                ),
            ));
        }
    }

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(status: &str, checks: &str) -> String {
        format!(
            "{}\n{}\n\n- Status: {}\n- Checks: {}\n",
            GUARD_MARKER, GUARD_HEADING, status, checks
        )
    }

    fn codes_of(text: &str) -> Vec<String> {
        validate_detailed(text)
            .unwrap()
            .into_iter()
            .map(|e| e.code)
            .collect()
    }

    #[test]
    fn test_well_formed_comment_passes() {
        assert!(codes_of(&comment("warning", "3 (pass 2, fail 0, warning 1)")).is_empty());
    }

    #[test]
    fn test_marker_rules() {
        let text = comment("pass", "1 (pass 1, fail 0, warning 0)");
        assert_eq!(
            codes_of(&text.replace(GUARD_MARKER, "")),
            vec![codes::MISSING_MARKER]
        );
        assert_eq!(
            codes_of(&format!("{}\n{}", text, GUARD_MARKER)),
            vec![codes::DUPLICATE_MARKER]
        );
    }

    #[test]
    fn test_counts_must_add_up_and_drive_status() {
        assert_eq!(
            codes_of(&comment("fail", "3 (pass 1, fail 1, warning 0)")),
            vec![codes::COUNT_MISMATCH]
        );
        assert_eq!(
            codes_of(&comment("pass", "2 (pass 1, fail 0, warning 1)")),
            vec![codes::STATUS_MISMATCH]
        );
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(codes_of(""), vec![codes::EMPTY]);
        let found = codes_of(&format!("{}\n- Status: green\n- Checks: many", GUARD_MARKER));
        assert_eq!(
            found,
            vec![
                codes::MISSING_HEADING,
                codes::INVALID_STATUS,
                codes::INVALID_COUNTS
            ]
        );
    }
}
