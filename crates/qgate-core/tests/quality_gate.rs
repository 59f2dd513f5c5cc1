//! Quality gate runs against real files in a temporary working directory.

use std::path::Path;

use qgate_core::io;
use qgate_core::quality_gate::run::{DEFAULT_LINT_REPORT, DEFAULT_TEST_REPORT};
use qgate_core::validators::{check_file, ArtifactKind};
use qgate_core::{summarize_quality_gate, EnvSnapshot, GateOptions, RunContext};
use qgate_domain::OutputMode;
use serde_json::{json, Value};

const SNAPSHOT: &str = "test-results/quality-summary.json";

fn write_reports(root: &Path, lint_errors: u64, failed_tests: u64, duration_ms: u64) {
    let env = EnvSnapshot::new(Vec::<(String, String)>::new(), root);
    io::write_json_pretty(
        &env.resolve(DEFAULT_LINT_REPORT),
        &json!([{"filePath": "src/a.ts", "errorCount": lint_errors, "warningCount": 0}]),
    )
    .expect("lint report");
    io::write_json_pretty(
        &env.resolve(DEFAULT_TEST_REPORT),
        &json!({
            "numTotalTestSuites": 1,
            "numFailedTestSuites": if failed_tests > 0 { 1 } else { 0 },
            "numTotalTests": 4,
            "numFailedTests": failed_tests,
            "testResults": [{
                "name": root.join("__tests__/smoke.test.ts").to_string_lossy(),
                "status": "passed",
                "startTime": 1_000,
                "endTime": 1_000 + duration_ms
            }]
        }),
    )
    .expect("test report");
}

fn run(root: &Path, vars: &[(&str, &str)], options: GateOptions) -> (i32, String, Value) {
    let env = EnvSnapshot::new(vars.iter().copied(), root);
    let mut ctx = RunContext::new(env, Vec::new());
    let options = GateOptions {
        json_output: Some(SNAPSHOT.to_string()),
        ..options
    };
    let code = summarize_quality_gate(&mut ctx, &options).expect("gate run");
    let stdout = String::from_utf8(ctx.into_output()).expect("utf8");
    let raw = std::fs::read_to_string(root.join(SNAPSHOT)).expect("snapshot");
    let snapshot: Value = serde_json::from_str(&raw).expect("snapshot json");
    (code, stdout, snapshot)
}

const SUCCESS: [(&str, &str); 2] = [("LINT_JOB_RESULT", "success"), ("SMOKE_JOB_RESULT", "success")];

// ---- Scenarios ----

#[test]
fn clean_run_passes() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_reports(dir.path(), 0, 0, 4_000);

    let (code, stdout, snapshot) = run(dir.path(), &SUCCESS, GateOptions::default());
    assert_eq!(code, 0);
    assert_eq!(snapshot["overallOk"], true);
    assert!(snapshot.get("failureClass").is_none());
    assert!(snapshot["recommendationId"].is_null());
    assert_eq!(snapshot["smokeSuiteFiles"], json!(["__tests__/smoke.test.ts"]));
    assert!(stdout.contains("- Overall Quality Gate: PASS"));
}

#[test]
fn failed_smoke_job_with_clean_report_is_inconsistent() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_reports(dir.path(), 0, 0, 4_000);
    let vars = [("LINT_JOB_RESULT", "success"), ("SMOKE_JOB_RESULT", "failure")];

    let (code, stdout, snapshot) = run(dir.path(), &vars, GateOptions::default());
    assert_eq!(code, 0, "inconsistencies only fail under --fail-on-missing");
    assert_eq!(snapshot["smokeOk"], true);
    assert_eq!(snapshot["inconsistencies"].as_array().map(Vec::len), Some(1));
    assert_eq!(snapshot["failureClass"], "inconsistent_state");
    assert_eq!(snapshot["recommendationId"], "QG-002");
    assert!(stdout.contains("### Consistency Checks"));

    let strict = GateOptions {
        fail_on_missing: true,
        ..GateOptions::default()
    };
    let (code, stdout, _) = run(dir.path(), &vars, strict);
    assert_eq!(code, 1);
    assert!(stdout.contains("inconsistent state between job results and published reports"));
}

#[test]
fn strict_budget_overrun_fails_the_gate() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_reports(dir.path(), 0, 0, 12_000);
    let vars = [
        SUCCESS[0],
        SUCCESS[1],
        ("SMOKE_DURATION_BUDGET_SECONDS", "10"),
        ("SMOKE_DURATION_BUDGET_STRICT", "true"),
    ];

    let (code, stdout, snapshot) = run(dir.path(), &vars, GateOptions::default());
    assert_eq!(code, 1);
    assert_eq!(snapshot["smokeDurationSeconds"], 12.0);
    assert_eq!(snapshot["failureClass"], "performance_budget");
    assert_eq!(snapshot["recommendationId"], "QG-006");
    assert!(stdout.contains("[OVER BUDGET]"));
    assert!(stdout.contains("smoke duration budget exceeded in strict mode"));
}

#[test]
fn missing_report_is_infra_artifact_and_strict_mode_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_reports(dir.path(), 0, 0, 4_000);
    std::fs::remove_file(dir.path().join(DEFAULT_TEST_REPORT)).expect("remove");

    let options = GateOptions {
        fail_on_missing: true,
        ..GateOptions::default()
    };
    let (code, stdout, snapshot) = run(dir.path(), &[], options);
    assert_eq!(code, 1);
    assert_eq!(snapshot["failureClass"], "infra_artifact");
    assert!(stdout.contains("- Smoke tests: FAIL (report missing)"));
}

#[test]
fn invalid_optional_aggregate_is_a_contract_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_reports(dir.path(), 0, 0, 4_000);
    std::fs::write(dir.path().join("selective.json"), "{\"schemaVersion\": 7}").expect("write");

    let options = GateOptions {
        selective_decisions_file: Some("selective.json".to_string()),
        ..GateOptions::default()
    };
    let (code, stdout, snapshot) = run(dir.path(), &SUCCESS, options);
    assert_eq!(code, 0);
    assert_eq!(snapshot["overallOk"], false);
    assert_eq!(snapshot["failureClass"], "selective_contract");
    assert_eq!(snapshot["selectiveDecisionsAggregateIssue"], true);
    assert!(stdout.contains("### Selective Checks\n- Aggregate: UNAVAILABLE"));
}

#[test]
fn unconfigured_optional_aggregates_are_not_issues() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_reports(dir.path(), 0, 0, 4_000);
    let (_, _, snapshot) = run(dir.path(), &SUCCESS, GateOptions::default());
    assert_eq!(snapshot["runtimeConfigDiagnosticsOk"], Value::Null);
    assert_eq!(snapshot["runtimeConfigDiagnosticsIssue"], false);
    assert_eq!(snapshot["validatorContractsSummaryValidationIssue"], false);
}

// ---- Snapshot and recommendation contracts ----

#[test]
fn snapshots_satisfy_the_quality_summary_validator() {
    let dir = tempfile::tempdir().expect("tempdir");
    for (lint_errors, failed_tests) in [(0, 0), (2, 0), (0, 1), (3, 2)] {
        write_reports(dir.path(), lint_errors, failed_tests, 4_000);
        let (_, _, snapshot) = run(dir.path(), &SUCCESS, GateOptions::default());
        let env = EnvSnapshot::new(Vec::<(String, String)>::new(), dir.path());
        let output =
            check_file(ArtifactKind::QualitySummary, &env, Path::new(SNAPSHOT)).expect("check");
        assert!(output.ok, "{:?} for {}", output.errors, snapshot);
    }
}

#[test]
fn baseline_recommendation_satisfies_its_validator() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_reports(dir.path(), 0, 0, 4_000);
    let vars = [
        SUCCESS[0],
        SUCCESS[1],
        ("SMOKE_SUITE_FILES_BASELINE", "__tests__/old.test.ts,__tests__/smoke.test.ts"),
    ];
    let options = GateOptions {
        baseline_recommendation_output: Some("test-results/baseline.json".to_string()),
        ..GateOptions::default()
    };
    let (code, stdout, snapshot) = run(dir.path(), &vars, options);
    assert_eq!(code, 0, "drift is report-only");
    assert_eq!(snapshot["smokeSuiteRemovedFiles"], json!(["__tests__/old.test.ts"]));
    assert!(stdout.contains("Removed: `__tests__/old.test.ts`"));

    let env = EnvSnapshot::new(Vec::<(String, String)>::new(), dir.path());
    let output = check_file(
        ArtifactKind::SmokeSuiteBaseline,
        &env,
        Path::new("test-results/baseline.json"),
    )
    .expect("check");
    assert!(output.ok, "{:?}", output.errors);
}

#[test]
fn json_mode_prints_the_snapshot_and_mirrors_the_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_reports(dir.path(), 0, 0, 4_000);
    let summary = dir.path().join("step-summary.md");
    let summary_path = summary.to_string_lossy().to_string();
    let vars = [SUCCESS[0], SUCCESS[1], ("GITHUB_STEP_SUMMARY", summary_path.as_str())];
    let options = GateOptions {
        mode: OutputMode::Json,
        ..GateOptions::default()
    };

    let (_, stdout, snapshot) = run(dir.path(), &vars, options);
    let printed: Value = serde_json::from_str(&stdout).expect("stdout json");
    assert_eq!(printed, snapshot);
    let mirrored = std::fs::read_to_string(summary).expect("step summary");
    assert!(mirrored.starts_with("## Quality Gate Summary"));
}
