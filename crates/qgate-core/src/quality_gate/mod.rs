//! Quality gate decision engine.
//!
//! [`evaluate`] is a pure function of [`GateInputs`]: it derives the lint and
//! smoke verdicts, the job/report inconsistencies, the duration budget state
//! and the single [`FailureClass`] of an unhealthy run. Loading inputs from
//! disk and the environment lives in [`run`]; the human report in [`report`].

use qgate_domain::schema::QUALITY_SNAPSHOT_SCHEMA_VERSION;
use qgate_domain::{
    FailureClass, JobResult, LintFileReport, QualitySnapshot, SelectiveDecision,
    SmokeSuiteBaselineRecommendation, TestRunReport,
};

pub mod report;
pub mod run;

pub use report::render_report;
pub use run::{load_inputs, summarize_quality_gate, GateOptions};

/// State of one optional aggregate artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSignal {
    /// A path was passed for this artifact.
    pub configured: bool,
    /// The artifact's own verdict, when it could be read.
    pub ok: Option<bool>,
    pub issue: bool,
    pub warnings: Vec<String>,
}

impl ArtifactSignal {
    pub fn not_configured() -> Self {
        Self::default()
    }

    /// Configured but missing, unparseable or invalid.
    pub fn degraded(warning: impl Into<String>) -> Self {
        Self {
            configured: true,
            ok: None,
            issue: true,
            warnings: vec![warning.into()],
        }
    }
}

/// Everything the engine decides on, already loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateInputs {
    /// `None` when missing or not a JSON array.
    pub lint_report: Option<Vec<LintFileReport>>,
    /// `None` when missing or not a JSON object.
    pub test_report: Option<TestRunReport>,
    pub lint_job: JobResult,
    pub smoke_job: JobResult,
    pub budget_seconds: Option<f64>,
    pub budget_strict: bool,
    pub previous_seconds: Option<f64>,
    /// Sorted, de-duplicated suite files of the test report.
    pub smoke_suite_files: Vec<String>,
    pub suite_baseline: Option<Vec<String>>,
    pub selective_decisions: Vec<SelectiveDecision>,
    pub selective: ArtifactSignal,
    pub validator_contracts: ArtifactSignal,
    pub runtime_config: ArtifactSignal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LintStats {
    pub files: usize,
    pub errors: u64,
    pub warnings: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmokeStats {
    pub suites: u64,
    pub failed_suites: u64,
    pub tests: u64,
    pub failed_tests: u64,
}

/// Smoke duration compared to the previous run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationTrend {
    pub previous_seconds: f64,
    pub delta_seconds: f64,
    pub delta_percent: f64,
}

impl DurationTrend {
    pub fn direction(&self) -> &'static str {
        if self.delta_seconds > 0.0 {
            "slower"
        } else if self.delta_seconds < 0.0 {
            "faster"
        } else {
            "unchanged"
        }
    }
}

/// Boolean signals the classifier looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateSignals {
    pub inconsistent: bool,
    pub report_missing: bool,
    pub lint_ok: bool,
    pub smoke_ok: bool,
    pub budget_blocking: bool,
    pub selective_issue: bool,
    pub validator_issue: bool,
    pub runtime_issue: bool,
}

impl GateSignals {
    pub fn overall_ok(&self) -> bool {
        self.lint_ok
            && self.smoke_ok
            && !self.inconsistent
            && !self.budget_blocking
            && !self.selective_issue
            && !self.validator_issue
            && !self.runtime_issue
    }
}

/// Single failure class of an unhealthy run, first match wins.
///
/// `None` when the run is healthy.
pub fn classify(signals: &GateSignals) -> Option<FailureClass> {
    if signals.overall_ok() {
        return None;
    }
    let reports_ok = signals.lint_ok && signals.smoke_ok;
    let otherwise_clean = reports_ok && !signals.budget_blocking;

    let class = if signals.inconsistent {
        FailureClass::InconsistentState
    } else if signals.report_missing {
        FailureClass::InfraArtifact
    } else if signals.runtime_issue && otherwise_clean {
        FailureClass::ConfigContract
    } else if signals.validator_issue && otherwise_clean {
        FailureClass::ValidatorContract
    } else if signals.selective_issue && otherwise_clean {
        FailureClass::SelectiveContract
    } else if signals.budget_blocking && reports_ok {
        FailureClass::PerformanceBudget
    } else if !signals.lint_ok && signals.smoke_ok {
        FailureClass::LintOnly
    } else if signals.lint_ok && !signals.smoke_ok {
        FailureClass::SmokeOnly
    } else {
        FailureClass::Mixed
    };
    Some(class)
}

/// Derived verdict of one gate run.
#[derive(Debug, Clone, PartialEq)]
pub struct GateEvaluation {
    pub lint_present: bool,
    pub lint: LintStats,
    pub lint_ok: bool,
    pub smoke_present: bool,
    pub smoke: SmokeStats,
    pub smoke_ok: bool,
    pub smoke_duration_seconds: f64,
    pub over_budget: bool,
    pub budget_blocking: bool,
    pub trend: Option<DurationTrend>,
    /// Drift against the suite baseline, when one was provided.
    pub drift: Option<SmokeSuiteBaselineRecommendation>,
    pub inconsistencies: Vec<String>,
    pub signals: GateSignals,
    pub overall_ok: bool,
    pub failure_class: Option<FailureClass>,
}

impl GateEvaluation {
    pub fn report_missing(&self) -> bool {
        !self.lint_present || !self.smoke_present
    }

    pub fn recommendation_id(&self) -> Option<&'static str> {
        self.failure_class.map(FailureClass::recommendation_id)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn job_inconsistencies(
    subject: &str,
    report: &str,
    job: JobResult,
    present: bool,
    ok: bool,
    clean_detail: &str,
    problem_detail: &str,
) -> Option<String> {
    match job {
        JobResult::Failure if present && ok => Some(format!(
            "{} job failed but {} report has {}.",
            subject, report, clean_detail
        )),
        JobResult::Success if !ok => Some(format!(
            "{} job succeeded but {} report indicates {} or is missing.",
            subject, report, problem_detail
        )),
        _ => None,
    }
}

pub fn evaluate(inputs: &GateInputs) -> GateEvaluation {
    let lint_present = inputs.lint_report.is_some();
    let lint = inputs
        .lint_report
        .as_deref()
        .map(|files| LintStats {
            files: files.len(),
            errors: files.iter().map(|f| f.error_count).sum(),
            warnings: files.iter().map(|f| f.warning_count).sum(),
        })
        .unwrap_or_default();
    let lint_ok = lint_present && lint.errors == 0 && lint.warnings == 0;

    let smoke_present = inputs.test_report.is_some();
    let smoke = inputs
        .test_report
        .as_ref()
        .map(|r| SmokeStats {
            suites: r.num_total_test_suites,
            failed_suites: r.num_failed_test_suites,
            tests: r.num_total_tests,
            failed_tests: r.num_failed_tests,
        })
        .unwrap_or_default();
    let smoke_ok = smoke_present && smoke.failed_suites == 0 && smoke.failed_tests == 0;

    let duration_ms = inputs
        .test_report
        .as_ref()
        .map(TestRunReport::duration_ms)
        .unwrap_or(0.0);
    let smoke_duration_seconds = if duration_ms > 0.0 {
        round2(duration_ms / 1000.0)
    } else {
        0.0
    };
    let over_budget = inputs
        .budget_seconds
        .map(|budget| smoke_duration_seconds > budget)
        .unwrap_or(false);
    let budget_blocking = over_budget && inputs.budget_strict;

    let trend = inputs.previous_seconds.map(|previous| DurationTrend {
        previous_seconds: previous,
        delta_seconds: round2(smoke_duration_seconds - previous),
        delta_percent: round2((smoke_duration_seconds - previous) / previous * 100.0),
    });

    let drift = inputs.suite_baseline.as_ref().map(|baseline| {
        SmokeSuiteBaselineRecommendation::from_files(
            inputs.smoke_suite_files.iter().cloned(),
            baseline.iter().cloned(),
        )
    });

    let inconsistencies: Vec<String> = [
        job_inconsistencies(
            "Lint",
            "lint",
            inputs.lint_job,
            lint_present,
            lint_ok,
            "0 errors and 0 warnings",
            "issues",
        ),
        job_inconsistencies(
            "Smoke",
            "smoke",
            inputs.smoke_job,
            smoke_present,
            smoke_ok,
            "0 failed suites/tests",
            "failures",
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    let signals = GateSignals {
        inconsistent: !inconsistencies.is_empty(),
        report_missing: !lint_present || !smoke_present,
        lint_ok,
        smoke_ok,
        budget_blocking,
        selective_issue: inputs.selective.issue,
        validator_issue: inputs.validator_contracts.issue,
        runtime_issue: inputs.runtime_config.issue,
    };

    GateEvaluation {
        lint_present,
        lint,
        lint_ok,
        smoke_present,
        smoke,
        smoke_ok,
        smoke_duration_seconds,
        over_budget,
        budget_blocking,
        trend,
        drift,
        inconsistencies,
        signals,
        overall_ok: signals.overall_ok(),
        failure_class: classify(&signals),
    }
}

/// Machine-readable snapshot of `evaluation`.
pub fn build_snapshot(inputs: &GateInputs, evaluation: &GateEvaluation) -> QualitySnapshot {
    let (added, removed) = evaluation
        .drift
        .as_ref()
        .map(|d| (d.added_files.clone(), d.removed_files.clone()))
        .unwrap_or_default();

    QualitySnapshot {
        schema_version: QUALITY_SNAPSHOT_SCHEMA_VERSION,
        overall_ok: evaluation.overall_ok,
        failure_class: evaluation.failure_class,
        recommendation_id: evaluation.recommendation_id().map(str::to_string),
        lint_ok: evaluation.lint_ok,
        smoke_ok: evaluation.smoke_ok,
        lint_job_result: inputs.lint_job,
        smoke_job_result: inputs.smoke_job,
        smoke_duration_seconds: evaluation.smoke_duration_seconds,
        smoke_duration_budget_seconds: inputs.budget_seconds.unwrap_or(0.0),
        smoke_duration_over_budget: evaluation.over_budget,
        budget_blocking: evaluation.budget_blocking,
        inconsistencies: evaluation.inconsistencies.clone(),
        smoke_suite_files: inputs.smoke_suite_files.clone(),
        smoke_suite_baseline_provided: inputs.suite_baseline.is_some(),
        smoke_suite_added_files: added,
        smoke_suite_removed_files: removed,
        selective_decisions: inputs.selective_decisions.clone(),
        selective_decision_warnings: inputs.selective.warnings.clone(),
        selective_decisions_aggregate_issue: inputs.selective.issue,
        runtime_config_diagnostics_ok: inputs.runtime_config.ok,
        runtime_config_diagnostics_warnings: inputs.runtime_config.warnings.clone(),
        runtime_config_diagnostics_issue: inputs.runtime_config.issue,
        validator_contracts_summary_validation_ok: inputs.validator_contracts.ok,
        validator_contracts_summary_validation_warnings: inputs
            .validator_contracts
            .warnings
            .clone(),
        validator_contracts_summary_validation_issue: inputs.validator_contracts.issue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qgate_domain::schema::TestFileResult;

    fn clean_inputs() -> GateInputs {
        GateInputs {
            lint_report: Some(vec![LintFileReport {
                file_path: "src/a.ts".to_string(),
                error_count: 0,
                warning_count: 0,
            }]),
            test_report: Some(TestRunReport {
                num_total_test_suites: 2,
                num_total_tests: 10,
                test_results: vec![TestFileResult {
                    name: "__tests__/a.test.ts".to_string(),
                    status: Some("passed".to_string()),
                    start_time: 1_000.0,
                    end_time: 13_000.0,
                }],
                ..TestRunReport::default()
            }),
            lint_job: JobResult::Success,
            smoke_job: JobResult::Success,
            ..GateInputs::default()
        }
    }

    #[test]
    fn test_clean_run_is_healthy() {
        let eval = evaluate(&clean_inputs());
        assert!(eval.overall_ok);
        assert_eq!(eval.failure_class, None);
        assert!(eval.inconsistencies.is_empty());
        assert_eq!(eval.smoke_duration_seconds, 12.0);
    }

    #[test]
    fn test_failed_job_with_clean_report_is_inconsistent() {
        let mut inputs = clean_inputs();
        inputs.smoke_job = JobResult::Failure;
        let eval = evaluate(&inputs);
        assert!(eval.smoke_ok);
        assert_eq!(eval.inconsistencies.len(), 1);
        assert_eq!(
            eval.inconsistencies[0],
            "Smoke job failed but smoke report has 0 failed suites/tests."
        );
        assert_eq!(eval.failure_class, Some(FailureClass::InconsistentState));
        assert_eq!(eval.recommendation_id(), Some("QG-002"));
    }

    #[test]
    fn test_missing_report_is_infra_artifact() {
        let mut inputs = clean_inputs();
        inputs.lint_report = None;
        inputs.lint_job = JobResult::Unknown;
        let eval = evaluate(&inputs);
        assert_eq!(eval.failure_class, Some(FailureClass::InfraArtifact));
    }

    #[test]
    fn test_strict_budget_overrun_is_performance_budget() {
        let mut inputs = clean_inputs();
        inputs.budget_seconds = Some(10.0);
        inputs.budget_strict = true;
        let eval = evaluate(&inputs);
        assert!(eval.over_budget && eval.budget_blocking);
        assert_eq!(eval.failure_class, Some(FailureClass::PerformanceBudget));

        inputs.budget_strict = false;
        let eval = evaluate(&inputs);
        assert!(eval.over_budget && !eval.budget_blocking);
        assert!(eval.overall_ok);
    }

    #[test]
    fn test_contract_classes_follow_priority() {
        let signals = GateSignals {
            lint_ok: true,
            smoke_ok: true,
            selective_issue: true,
            validator_issue: true,
            runtime_issue: true,
            ..GateSignals::default()
        };
        assert_eq!(classify(&signals), Some(FailureClass::ConfigContract));

        let signals = GateSignals {
            runtime_issue: false,
            ..signals
        };
        assert_eq!(classify(&signals), Some(FailureClass::ValidatorContract));

        let signals = GateSignals {
            validator_issue: false,
            ..signals
        };
        assert_eq!(classify(&signals), Some(FailureClass::SelectiveContract));
    }

    #[test]
    fn test_contract_issue_with_failing_lint_is_lint_only() {
        let signals = GateSignals {
            lint_ok: false,
            smoke_ok: true,
            selective_issue: true,
            ..GateSignals::default()
        };
        assert_eq!(classify(&signals), Some(FailureClass::LintOnly));

        let signals = GateSignals {
            smoke_ok: false,
            ..signals
        };
        assert_eq!(classify(&signals), Some(FailureClass::Mixed));
    }

    #[test]
    fn test_trend_and_drift() {
        let mut inputs = clean_inputs();
        inputs.previous_seconds = Some(10.0);
        inputs.smoke_suite_files = vec!["a.test.ts".to_string(), "b.test.ts".to_string()];
        inputs.suite_baseline = Some(vec!["a.test.ts".to_string(), "c.test.ts".to_string()]);
        let eval = evaluate(&inputs);

        let trend = eval.trend.unwrap();
        assert_eq!(trend.delta_seconds, 2.0);
        assert_eq!(trend.delta_percent, 20.0);
        assert_eq!(trend.direction(), "slower");

        let drift = eval.drift.as_ref().unwrap();
        assert_eq!(drift.added_files, vec!["b.test.ts"]);
        assert_eq!(drift.removed_files, vec!["c.test.ts"]);
        assert!(eval.overall_ok, "drift is report-only");
    }

    #[test]
    fn test_snapshot_of_healthy_run_has_null_recommendation() {
        let inputs = clean_inputs();
        let snapshot = build_snapshot(&inputs, &evaluate(&inputs));
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("failureClass").is_none());
        assert!(value["recommendationId"].is_null());
        assert_eq!(value["lintJobResult"], "success");
    }
}
