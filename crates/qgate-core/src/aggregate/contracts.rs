//! Validator contracts summarizer and guard comment renderer.

use std::io::Write;

use qgate_domain::{
    CheckStatus, CheckSummary, OutputMode, ValidatorContractsSummary, ValidatorOutput,
};

use crate::context::{EnvSnapshot, RunContext};
use crate::error::Result;
use crate::io::{self, JsonRead};
use crate::obs;
use crate::validators::validator_guard_comment::{GUARD_HEADING, GUARD_MARKER};
use crate::validators::{validator_for, ArtifactKind};

/// Checks summarized, in report order.
pub const CONTRACT_CHECKS: [ArtifactKind; 9] = [
    ArtifactKind::SelectiveDecisions,
    ArtifactKind::CiIncidentPayload,
    ArtifactKind::CiIncidentSnippet,
    ArtifactKind::ValidatorGuardComment,
    ArtifactKind::ErrorCodesDocs,
    ArtifactKind::ErrorCodesPolicy,
    ArtifactKind::WorkflowContract,
    ArtifactKind::PrCiException,
    ArtifactKind::SmokeSuiteBaseline,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeOptions {
    /// Directory holding `<id>-validation.json` outputs.
    pub dir: String,
    pub output_file: String,
    pub comment_file: Option<String>,
    pub fail_on_missing: bool,
    pub mode: OutputMode,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            dir: "test-results".to_string(),
            output_file: "test-results/validator-contracts-summary.json".to_string(),
            comment_file: None,
            fail_on_missing: false,
            mode: OutputMode::Text,
        }
    }
}

pub fn validation_file(dir: &str, kind: ArtifactKind) -> String {
    format!("{}/{}-validation.json", dir.trim_end_matches('/'), kind)
}

fn warning_check(kind: ArtifactKind, file: String, reason: String) -> CheckSummary {
    obs::emit_artifact_degraded(kind.as_str(), &reason);
    CheckSummary {
        id: kind.as_str().to_string(),
        title: validator_for(kind).failure_prefix(),
        file,
        status: CheckStatus::Warning,
        ok: false,
        error_count: 0,
        error_codes: Vec::new(),
        reason,
    }
}

/// Summarize one `ValidatorOutput` file.
fn summarize_check(env: &EnvSnapshot, dir: &str, kind: ArtifactKind) -> CheckSummary {
    let file = validation_file(dir, kind);
    let output = match io::read_json_lenient(&env.resolve(&file)) {
        JsonRead::Missing => {
            return warning_check(kind, file, "validation output not found".to_string())
        }
        JsonRead::Unparseable(reason) => {
            return warning_check(kind, file, format!("invalid JSON: {}", reason))
        }
        JsonRead::Parsed(value) => value,
    };

    let output: ValidatorOutput = match serde_json::from_value(output) {
        Ok(output) => output,
        Err(e) => return warning_check(kind, file, format!("not a validator output: {}", e)),
    };
    let violations = output.contract_violations();
    if !violations.is_empty() {
        return warning_check(
            kind,
            file,
            format!("inconsistent validator output: {}", violations.join(" ")),
        );
    }

    CheckSummary {
        id: kind.as_str().to_string(),
        title: validator_for(kind).failure_prefix(),
        file,
        status: if output.ok {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        },
        ok: output.ok,
        error_count: output.error_count,
        error_codes: output.unique_codes(),
        reason: String::new(),
    }
}

pub fn summarize_contracts(env: &EnvSnapshot, dir: &str) -> ValidatorContractsSummary {
    let checks = CONTRACT_CHECKS
        .iter()
        .map(|kind| summarize_check(env, dir, *kind))
        .collect();
    let summary = ValidatorContractsSummary::from_checks(checks);
    obs::emit_aggregate_built(
        "validator-contracts-summary",
        summary.check_count,
        summary.warning_count,
    );
    summary
}

/// PR comment checked by the guard comment validator.
pub fn render_guard_comment(summary: &ValidatorContractsSummary) -> String {
    let mut md = format!(
        "{}\n{}\n\n- Status: {}\n- Checks: {} (pass {}, fail {}, warning {})\n- Total errors: {}\n",
        GUARD_MARKER,
        GUARD_HEADING,
        summary.overall_status,
        summary.check_count,
        summary.pass_count,
        summary.fail_count,
        summary.warning_count,
        summary.total_errors
    );
    if !summary.error_codes.is_empty() {
        let codes: Vec<String> = summary
            .error_codes
            .iter()
            .map(|c| format!("`{}`", c))
            .collect();
        md.push_str(&format!("- Error codes: {}\n", codes.join(", ")));
    }
    md.push_str("\n| Check | Status | Errors | Note |\n| --- | --- | --- | --- |\n");
    for check in &summary.checks {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            check.id, check.status, check.error_count, check.reason
        ));
    }
    md
}

fn render_report(summary: &ValidatorContractsSummary) -> String {
    let mut text = format!(
        "## Validator Contracts Summary\n\n- Overall: {}\n- Checks: {} (pass {}, fail {}, warning {})\n- Total errors: {}\n",
        summary.overall_status.as_str().to_uppercase(),
        summary.check_count,
        summary.pass_count,
        summary.fail_count,
        summary.warning_count,
        summary.total_errors
    );
    for check in &summary.checks {
        let detail = match check.status {
            CheckStatus::Pass => String::new(),
            CheckStatus::Fail => format!(" ({})", check.error_codes.join(", ")),
            CheckStatus::Warning => format!(" ({})", check.reason),
        };
        text.push_str(&format!("- {}: {}{}\n", check.id, check.status, detail));
    }
    text
}

/// Summarize, write the summary (and comment), and report.
///
/// Exits 1 only with `fail_on_missing` and at least one unusable output.
pub fn summarize_validator_contracts<W: Write>(
    ctx: &mut RunContext<W>,
    options: &SummarizeOptions,
) -> Result<i32> {
    let summary = summarize_contracts(&ctx.env, &options.dir);
    io::write_json_pretty(&ctx.env.resolve(&options.output_file), &summary)?;
    if let Some(comment_file) = options.comment_file.as_deref() {
        io::write_text(&ctx.env.resolve(comment_file), &render_guard_comment(&summary))?;
    }

    match options.mode {
        OutputMode::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            ctx.print(&format!("{}\n", json))?;
        }
        OutputMode::Text => {
            let report = render_report(&summary);
            ctx.publish(&report)?;
        }
    }

    let missing = summary.warning_count > 0;
    Ok(if options.fail_on_missing && missing { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{validator_contracts_summary, validator_guard_comment};
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn env_in(dir: &std::path::Path) -> EnvSnapshot {
        EnvSnapshot::new(Vec::<(String, String)>::new(), dir)
    }

    fn write_output(env: &EnvSnapshot, kind: ArtifactKind, ok: bool, codes: &[&str]) {
        let errors: Vec<Value> = codes
            .iter()
            .map(|c| json!({"code": c, "field": "x", "message": "m"}))
            .collect();
        let output = json!({
            "contractVersion": 1,
            "ok": ok,
            "errorCount": errors.len(),
            "errors": errors
        });
        io::write_json_pretty(&env.resolve(validation_file("out", kind)), &output).unwrap();
    }

    #[test]
    fn test_missing_outputs_are_warnings() {
        let dir = tempdir().expect("tempdir");
        let summary = summarize_contracts(&env_in(dir.path()), "out");
        assert_eq!(summary.check_count, CONTRACT_CHECKS.len());
        assert_eq!(summary.warning_count, CONTRACT_CHECKS.len());
        assert_eq!(summary.overall_status, CheckStatus::Warning);
        assert_eq!(summary.checks[0].reason, "validation output not found");
    }

    #[test]
    fn test_codes_are_unioned_in_first_seen_order() {
        let dir = tempdir().expect("tempdir");
        let env = env_in(dir.path());
        for kind in CONTRACT_CHECKS {
            write_output(&env, kind, true, &[]);
        }
        write_output(&env, ArtifactKind::CiIncidentPayload, false, &["B", "A", "B"]);
        write_output(&env, ArtifactKind::WorkflowContract, false, &["A", "C"]);

        let summary = summarize_contracts(&env, "out");
        assert_eq!(summary.overall_status, CheckStatus::Fail);
        assert_eq!(summary.fail_count, 2);
        assert_eq!(summary.total_errors, 5);
        assert_eq!(summary.error_codes, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_contract_breaking_outputs_are_warnings() {
        let dir = tempdir().expect("tempdir");
        let env = env_in(dir.path());
        let path = env.resolve(validation_file("out", ArtifactKind::SelectiveDecisions));
        io::write_json_pretty(
            &path,
            &json!({"contractVersion": 99, "ok": true, "errorCount": 0, "errors": []}),
        )
        .unwrap();
        let path = env.resolve(validation_file("out", ArtifactKind::CiIncidentPayload));
        io::write_json_pretty(
            &path,
            &json!({"contractVersion": 1, "ok": true, "errorCount": 3, "errors": []}),
        )
        .unwrap();

        let summary = summarize_contracts(&env, "out");
        let version = &summary.checks[0];
        assert_eq!(version.status, CheckStatus::Warning);
        assert!(!version.ok);
        assert_eq!(
            version.reason,
            "inconsistent validator output: contractVersion (99) must be 1."
        );
        let counts = &summary.checks[1];
        assert_eq!(counts.status, CheckStatus::Warning);
        assert_eq!(counts.error_count, 0);
        assert!(counts.reason.contains("errorCount (3) does not match errors (0)."));
        assert!(counts.reason.contains("ok (true) does not match errorCount (3)."));
    }

    #[test]
    fn test_outputs_satisfy_their_own_validators() {
        let dir = tempdir().expect("tempdir");
        let env = env_in(dir.path());
        write_output(&env, ArtifactKind::SelectiveDecisions, false, &["X"]);
        let summary = summarize_contracts(&env, "out");

        let raw = serde_json::to_string(&summary).unwrap();
        assert!(validator_contracts_summary::validate_detailed(&raw).is_empty());
        let comment = render_guard_comment(&summary);
        assert!(validator_guard_comment::validate_detailed(&comment)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_fail_on_missing_sets_exit_code() {
        let dir = tempdir().expect("tempdir");
        let mut ctx = RunContext::new(env_in(dir.path()), Vec::new());
        let options = SummarizeOptions {
            dir: "out".to_string(),
            comment_file: Some("out/comment.md".to_string()),
            fail_on_missing: true,
            ..SummarizeOptions::default()
        };
        assert_eq!(summarize_validator_contracts(&mut ctx, &options).unwrap(), 1);
        assert!(dir.path().join("out/comment.md").exists());
        assert!(dir
            .path()
            .join("test-results/validator-contracts-summary.json")
            .exists());
    }
}
