//! Loading gate inputs and running the gate end to end.

use std::collections::BTreeSet;
use std::io::Write;

use serde_json::Value;

use qgate_domain::schema::DiagnosticSeverity;
use qgate_domain::{
    JobResult, LintFileReport, OutputMode, RuntimeConfigDiagnostics, SelectiveDecision,
    SelectiveDecisionsAggregate, SmokeSuiteBaselineRecommendation, TestRunReport, ValidatorOutput,
};

use super::{build_snapshot, evaluate, render_report, ArtifactSignal, GateEvaluation, GateInputs};
use crate::context::{EnvSnapshot, RunContext};
use crate::error::Result;
use crate::io::{self, JsonRead};
use crate::obs;
use crate::validators::selective_decisions;

pub const LINT_JOB_RESULT_VAR: &str = "LINT_JOB_RESULT";
pub const SMOKE_JOB_RESULT_VAR: &str = "SMOKE_JOB_RESULT";
pub const BUDGET_SECONDS_VAR: &str = "SMOKE_DURATION_BUDGET_SECONDS";
pub const BUDGET_STRICT_VAR: &str = "SMOKE_DURATION_BUDGET_STRICT";
pub const PREVIOUS_SECONDS_VAR: &str = "SMOKE_DURATION_PREVIOUS_SECONDS";
pub const SUITE_BASELINE_VAR: &str = "SMOKE_SUITE_FILES_BASELINE";

pub const DEFAULT_LINT_REPORT: &str = "test-results/eslint-results.json";
pub const DEFAULT_TEST_REPORT: &str = "test-results/jest-smoke-results.json";
pub const DEFAULT_MAX_ITEMS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOptions {
    pub lint_report: String,
    pub test_report: String,
    pub selective_decisions_file: Option<String>,
    /// `ValidatorOutput` of the validator-contracts-summary validation.
    pub validator_file: Option<String>,
    pub runtime_config_file: Option<String>,
    /// Where to write the `QualitySnapshot`.
    pub json_output: Option<String>,
    pub baseline_recommendation_output: Option<String>,
    pub max_items: usize,
    pub fail_on_missing: bool,
    pub mode: OutputMode,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            lint_report: DEFAULT_LINT_REPORT.to_string(),
            test_report: DEFAULT_TEST_REPORT.to_string(),
            selective_decisions_file: None,
            validator_file: None,
            runtime_config_file: None,
            json_output: None,
            baseline_recommendation_output: None,
            max_items: DEFAULT_MAX_ITEMS,
            fail_on_missing: false,
            mode: OutputMode::Text,
        }
    }
}

/// Read a required report leniently; the wrong shape counts as missing.
fn read_report<T: serde::de::DeserializeOwned>(
    env: &EnvSnapshot,
    path: &str,
    artifact: &str,
    shape_ok: fn(&Value) -> bool,
) -> Option<T> {
    let value = match io::read_json_lenient(&env.resolve(path)) {
        JsonRead::Parsed(value) => value,
        JsonRead::Missing => {
            obs::emit_artifact_degraded(artifact, &format!("{} not found", path));
            return None;
        }
        JsonRead::Unparseable(reason) => {
            obs::emit_artifact_degraded(artifact, &reason);
            return None;
        }
    };
    if !shape_ok(&value) {
        obs::emit_artifact_degraded(artifact, &format!("{} has an unexpected shape", path));
        return None;
    }
    match serde_json::from_value(value) {
        Ok(report) => Some(report),
        Err(e) => {
            obs::emit_artifact_degraded(artifact, &e);
            None
        }
    }
}

/// `SMOKE_SUITE_FILES_BASELINE` as a JSON array or a comma-separated list.
pub fn parse_suite_baseline(raw: &str) -> Option<Vec<String>> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        let files: Vec<String> = serde_json::from_str(raw).ok()?;
        return Some(files.into_iter().map(|f| f.trim().to_string()).collect());
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Suite file names relative to the working directory, sorted and unique.
pub fn suite_files(env: &EnvSnapshot, report: Option<&TestRunReport>) -> Vec<String> {
    let Some(report) = report else {
        return Vec::new();
    };
    report
        .test_results
        .iter()
        .map(|r| r.name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| env.relative_display(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn load_selective(env: &EnvSnapshot, path: &str) -> (ArtifactSignal, Vec<SelectiveDecision>) {
    let value = match io::read_json_lenient(&env.resolve(path)) {
        JsonRead::Parsed(value) => value,
        JsonRead::Missing => {
            return (
                ArtifactSignal::degraded(format!(
                    "Selective decisions aggregate not found: {}",
                    path
                )),
                Vec::new(),
            )
        }
        JsonRead::Unparseable(reason) => {
            return (
                ArtifactSignal::degraded(format!(
                    "Selective decisions aggregate is not valid JSON: {} ({})",
                    path, reason
                )),
                Vec::new(),
            )
        }
    };

    let errors = selective_decisions::validate_detailed(&value.to_string());
    if !errors.is_empty() {
        let signal = ArtifactSignal {
            configured: true,
            ok: Some(false),
            issue: true,
            warnings: errors.into_iter().map(|e| e.message).collect(),
        };
        return (signal, Vec::new());
    }
    match serde_json::from_value::<SelectiveDecisionsAggregate>(value) {
        Ok(aggregate) => (
            ArtifactSignal {
                configured: true,
                ok: Some(true),
                issue: false,
                warnings: aggregate.warnings,
            },
            aggregate.decisions,
        ),
        Err(e) => (
            ArtifactSignal::degraded(format!(
                "Selective decisions aggregate is invalid: {} ({})",
                path, e
            )),
            Vec::new(),
        ),
    }
}

fn load_validator_contracts(env: &EnvSnapshot, path: &str) -> ArtifactSignal {
    let value = match io::read_json_lenient(&env.resolve(path)) {
        JsonRead::Parsed(value) => value,
        JsonRead::Missing => {
            return ArtifactSignal::degraded(format!(
                "Validator contracts summary validation not found: {}",
                path
            ))
        }
        JsonRead::Unparseable(reason) => {
            return ArtifactSignal::degraded(format!(
                "Validator contracts summary validation is not valid JSON: {} ({})",
                path, reason
            ))
        }
    };
    let output: ValidatorOutput = match serde_json::from_value(value) {
        Ok(output) => output,
        Err(e) => {
            return ArtifactSignal::degraded(format!(
                "Validator contracts summary validation is not a validator output: {} ({})",
                path, e
            ))
        }
    };
    let violations = output.contract_violations();
    if !violations.is_empty() {
        return ArtifactSignal {
            configured: true,
            ok: None,
            issue: true,
            warnings: violations
                .into_iter()
                .map(|v| {
                    format!(
                        "Validator contracts summary validation is inconsistent: {}",
                        v
                    )
                })
                .collect(),
        };
    }

    let mut warnings: Vec<String> = output.errors.into_iter().map(|e| e.message).collect();
    if !output.ok && warnings.is_empty() {
        warnings.push("Validator contracts summary validation failed.".to_string());
    }
    ArtifactSignal {
        configured: true,
        ok: Some(output.ok),
        issue: !output.ok,
        warnings,
    }
}

fn load_runtime_config(env: &EnvSnapshot, path: &str) -> ArtifactSignal {
    let raw = match io::read_json_lenient(&env.resolve(path)) {
        JsonRead::Parsed(value) => value.to_string(),
        JsonRead::Missing => {
            return ArtifactSignal::degraded(format!(
                "Runtime config diagnostics not found: {}",
                path
            ))
        }
        JsonRead::Unparseable(reason) => {
            return ArtifactSignal::degraded(format!(
                "Runtime config diagnostics are not valid JSON: {} ({})",
                path, reason
            ))
        }
    };
    let diagnostics = match RuntimeConfigDiagnostics::from_json(&raw) {
        Ok(diagnostics) => diagnostics,
        Err(e) => {
            return ArtifactSignal::degraded(format!(
                "Runtime config diagnostics are invalid: {} ({})",
                path, e
            ))
        }
    };

    let inconsistencies = diagnostics.inconsistencies();
    let mut warnings: Vec<String> = inconsistencies.clone();
    warnings.extend(
        diagnostics
            .diagnostics
            .iter()
            .filter(|d| d.severity != DiagnosticSeverity::Info)
            .map(|d| format!("{}: {}", d.code, d.message)),
    );
    ArtifactSignal {
        configured: true,
        ok: Some(diagnostics.ok),
        issue: !diagnostics.ok || !inconsistencies.is_empty(),
        warnings,
    }
}

/// Load every input from the filesystem and the environment snapshot.
pub fn load_inputs(env: &EnvSnapshot, options: &GateOptions) -> GateInputs {
    let lint_report: Option<Vec<LintFileReport>> =
        read_report(env, &options.lint_report, "lint-report", Value::is_array);
    let test_report: Option<TestRunReport> =
        read_report(env, &options.test_report, "test-report", Value::is_object);

    let (selective, selective_decisions) = match options.selective_decisions_file.as_deref() {
        Some(path) => load_selective(env, path),
        None => (ArtifactSignal::not_configured(), Vec::new()),
    };
    let validator_contracts = options
        .validator_file
        .as_deref()
        .map(|path| load_validator_contracts(env, path))
        .unwrap_or_else(ArtifactSignal::not_configured);
    let runtime_config = options
        .runtime_config_file
        .as_deref()
        .map(|path| load_runtime_config(env, path))
        .unwrap_or_else(ArtifactSignal::not_configured);

    for (artifact, signal) in [
        ("selective-decisions", &selective),
        ("validator-contracts", &validator_contracts),
        ("runtime-config-diagnostics", &runtime_config),
    ] {
        if signal.issue {
            obs::emit_artifact_degraded(artifact, &signal.warnings.join("; "));
        }
    }

    GateInputs {
        smoke_suite_files: suite_files(env, test_report.as_ref()),
        lint_report,
        test_report,
        lint_job: JobResult::parse_lenient(env.var(LINT_JOB_RESULT_VAR).unwrap_or_default()),
        smoke_job: JobResult::parse_lenient(env.var(SMOKE_JOB_RESULT_VAR).unwrap_or_default()),
        budget_seconds: env.positive_number(BUDGET_SECONDS_VAR),
        budget_strict: env.flag(BUDGET_STRICT_VAR),
        previous_seconds: env.positive_number(PREVIOUS_SECONDS_VAR),
        suite_baseline: env.var(SUITE_BASELINE_VAR).and_then(parse_suite_baseline),
        selective_decisions,
        selective,
        validator_contracts,
        runtime_config,
    }
}

/// Exit status and the closing failure line, if any.
pub fn exit_status(
    evaluation: &GateEvaluation,
    fail_on_missing: bool,
) -> (i32, Option<&'static str>) {
    let line = if fail_on_missing && evaluation.report_missing() {
        "Quality summary failed: required report artifact is missing."
    } else if fail_on_missing && !evaluation.inconsistencies.is_empty() {
        "Quality summary failed: inconsistent state between job results and published reports."
    } else if evaluation.budget_blocking {
        "Quality summary failed: smoke duration budget exceeded in strict mode."
    } else {
        return (0, None);
    };
    (1, Some(line))
}

/// Evaluate the gate, write the snapshot and recommendation, and report.
///
/// Most partial-data situations are only reported; the exit status is
/// non-zero for missing reports or inconsistencies under `fail_on_missing`,
/// and for a blocking budget overrun.
pub fn summarize_quality_gate<W: Write>(
    ctx: &mut RunContext<W>,
    options: &GateOptions,
) -> Result<i32> {
    let inputs = load_inputs(&ctx.env, options);
    let evaluation = evaluate(&inputs);
    let snapshot = build_snapshot(&inputs, &evaluation);
    let (exit_code, failure_line) = exit_status(&evaluation, options.fail_on_missing);

    let mut report = render_report(&inputs, &evaluation, options.max_items);
    if let Some(path) = options.json_output.as_deref() {
        if let Err(e) = io::write_json_pretty(&ctx.env.resolve(path), &snapshot) {
            report.push_str(&format!(
                "\n- Warning: failed to write quality snapshot to {}: {}\n",
                path, e
            ));
        }
    }
    if let Some(path) = options.baseline_recommendation_output.as_deref() {
        let recommendation = evaluation.drift.clone().unwrap_or_else(|| {
            SmokeSuiteBaselineRecommendation::from_files(
                inputs.smoke_suite_files.iter().cloned(),
                Vec::<String>::new(),
            )
        });
        io::write_json_pretty(&ctx.env.resolve(path), &recommendation)?;
    }
    if let Some(line) = failure_line {
        report.push_str(&format!("\n- {}\n", line));
    }

    match options.mode {
        OutputMode::Json => {
            let json = serde_json::to_string_pretty(&snapshot)?;
            ctx.print(&format!("{}\n", json))?;
            ctx.append_step_summary(&report)?;
        }
        OutputMode::Text => ctx.publish(&report)?,
    }

    obs::emit_gate_evaluated(
        evaluation.overall_ok,
        evaluation.failure_class.map(|c| c.as_str()),
        exit_code,
    );
    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_suite_baseline_accepts_csv_and_json() {
        assert_eq!(
            parse_suite_baseline(" a.ts, b.ts ,,").unwrap(),
            vec!["a.ts", "b.ts"]
        );
        assert_eq!(
            parse_suite_baseline(r#"["a.ts", "b.ts"]"#).unwrap(),
            vec!["a.ts", "b.ts"]
        );
        assert!(parse_suite_baseline("[not json").is_none());
    }

    #[test]
    fn test_suite_files_are_relative_sorted_and_unique() {
        let env = EnvSnapshot::new(Vec::<(String, String)>::new(), "/work");
        let report: TestRunReport = serde_json::from_value(json!({
            "testResults": [
                {"name": "/work/__tests__/b.test.ts"},
                {"name": "/work/__tests__/a.test.ts"},
                {"name": "/work/__tests__/b.test.ts"}
            ]
        }))
        .unwrap();
        assert_eq!(
            suite_files(&env, Some(&report)),
            vec!["__tests__/a.test.ts", "__tests__/b.test.ts"]
        );
    }

    #[test]
    fn test_wrong_shape_reports_count_as_missing() {
        let dir = tempdir().expect("tempdir");
        let env = EnvSnapshot::new(Vec::<(String, String)>::new(), dir.path());
        let lint = json!({"errorCount": 0});
        io::write_json_pretty(&env.resolve(DEFAULT_LINT_REPORT), &lint).unwrap();
        io::write_json_pretty(&env.resolve(DEFAULT_TEST_REPORT), &json!([])).unwrap();
        let inputs = load_inputs(&env, &GateOptions::default());
        assert!(inputs.lint_report.is_none());
        assert!(inputs.test_report.is_none());
    }

    #[test]
    fn test_runtime_config_inconsistency_is_an_issue() {
        let dir = tempdir().expect("tempdir");
        let env = EnvSnapshot::new(Vec::<(String, String)>::new(), dir.path());
        let path = "test-results/runtime-config-diagnostics.json";
        io::write_json_pretty(
            &env.resolve(path),
            &json!({
                "schemaVersion": 1,
                "ok": true,
                "errorCount": 0,
                "warningCount": 0,
                "diagnostics": [{"code": "API_URL", "severity": "warning", "message": "not https"}]
            }),
        )
        .unwrap();
        let signal = load_runtime_config(&env, path);
        assert!(signal.issue);
        assert_eq!(signal.ok, Some(true));
        assert_eq!(
            signal.warnings,
            vec![
                "warningCount (0) does not match warning diagnostics (1).",
                "API_URL: not https"
            ]
        );
    }

    #[test]
    fn test_failed_validator_output_is_an_issue() {
        let dir = tempdir().expect("tempdir");
        let env = EnvSnapshot::new(Vec::<(String, String)>::new(), dir.path());
        io::write_json_pretty(
            &env.resolve("v.json"),
            &json!({
                "contractVersion": 1,
                "ok": false,
                "errorCount": 1,
                "errors": [{"code": "X", "field": "f", "message": "boom"}]
            }),
        )
        .unwrap();
        let signal = load_validator_contracts(&env, "v.json");
        assert!(signal.issue);
        assert_eq!(signal.warnings, vec!["boom"]);

        let missing = load_validator_contracts(&env, "nope.json");
        assert!(missing.issue && missing.ok.is_none());
    }

    #[test]
    fn test_inconsistent_validator_output_is_an_issue() {
        let dir = tempdir().expect("tempdir");
        let env = EnvSnapshot::new(Vec::<(String, String)>::new(), dir.path());
        io::write_json_pretty(
            &env.resolve("version.json"),
            &json!({"contractVersion": 99, "ok": true, "errorCount": 0, "errors": []}),
        )
        .unwrap();
        let signal = load_validator_contracts(&env, "version.json");
        assert!(signal.issue);
        assert_eq!(signal.ok, None);
        assert_eq!(
            signal.warnings,
            vec!["Validator contracts summary validation is inconsistent: contractVersion (99) must be 1."]
        );

        io::write_json_pretty(
            &env.resolve("counts.json"),
            &json!({"contractVersion": 1, "ok": true, "errorCount": 3, "errors": []}),
        )
        .unwrap();
        let signal = load_validator_contracts(&env, "counts.json");
        assert!(signal.issue);
        assert_eq!(signal.warnings.len(), 2);

        let inputs = GateInputs {
            validator_contracts: signal,
            ..GateInputs::default()
        };
        assert!(evaluate(&inputs).signals.validator_issue);
    }

    #[test]
    fn test_exit_status_policy() {
        let inputs = GateInputs::default();
        let evaluation = evaluate(&inputs);
        assert_eq!(exit_status(&evaluation, false).0, 0);
        let (code, line) = exit_status(&evaluation, true);
        assert_eq!(code, 1);
        assert_eq!(
            line,
            Some("Quality summary failed: required report artifact is missing.")
        );
    }
}
