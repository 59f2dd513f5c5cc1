//! Versioned CI artifact definitions
//!
//! Every JSON artifact carries an explicit integer `contractVersion` or
//! `schemaVersion`. Versions must match exactly; nothing here attempts
//! forward compatibility.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ContractError, Result};

pub const SELECTIVE_DECISION_CONTRACT_VERSION: u32 = 1;
pub const SELECTIVE_DECISIONS_SCHEMA_VERSION: u32 = 1;
pub const VALIDATOR_CONTRACTS_SUMMARY_SCHEMA_VERSION: u32 = 1;
pub const CI_INCIDENT_PAYLOAD_SCHEMA_VERSION: u32 = 1;
pub const QUALITY_SNAPSHOT_SCHEMA_VERSION: u32 = 1;
pub const RUNTIME_CONFIG_DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;
pub const SMOKE_SUITE_BASELINE_SCHEMA_VERSION: u32 = 1;

/// Documentation page that carries the `QG-###` runbook anchors.
pub const RECOMMENDATION_DOCS_PAGE: &str = "docs/TESTING.md";

fn check_version(artifact: &'static str, expected: u32, found: u32) -> Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(ContractError::UnsupportedVersion {
            artifact,
            expected,
            found: found as u64,
        })
    }
}

// ============================================================================
// 1. FAILURE CLASSIFICATION
// ============================================================================

/// Single, mutually exclusive explanation of an unhealthy pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    InfraArtifact,
    InconsistentState,
    LintOnly,
    SmokeOnly,
    Mixed,
    PerformanceBudget,
    SelectiveContract,
    ValidatorContract,
    ConfigContract,
}

impl FailureClass {
    /// Every class, ordered by recommendation id.
    pub const ALL: [FailureClass; 9] = [
        FailureClass::InfraArtifact,
        FailureClass::InconsistentState,
        FailureClass::LintOnly,
        FailureClass::SmokeOnly,
        FailureClass::Mixed,
        FailureClass::PerformanceBudget,
        FailureClass::SelectiveContract,
        FailureClass::ValidatorContract,
        FailureClass::ConfigContract,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FailureClass::InfraArtifact => "infra_artifact",
            FailureClass::InconsistentState => "inconsistent_state",
            FailureClass::LintOnly => "lint_only",
            FailureClass::SmokeOnly => "smoke_only",
            FailureClass::Mixed => "mixed",
            FailureClass::PerformanceBudget => "performance_budget",
            FailureClass::SelectiveContract => "selective_contract",
            FailureClass::ValidatorContract => "validator_contract",
            FailureClass::ConfigContract => "config_contract",
        }
    }

    /// Remediation id surfaced to humans. Total over the enum.
    pub fn recommendation_id(self) -> &'static str {
        match self {
            FailureClass::InfraArtifact => "QG-001",
            FailureClass::InconsistentState => "QG-002",
            FailureClass::LintOnly => "QG-003",
            FailureClass::SmokeOnly => "QG-004",
            FailureClass::Mixed => "QG-005",
            FailureClass::PerformanceBudget => "QG-006",
            FailureClass::SelectiveContract => "QG-007",
            FailureClass::ValidatorContract => "QG-008",
            FailureClass::ConfigContract => "QG-009",
        }
    }

    /// `docs/TESTING.md#qg-00N`
    pub fn docs_anchor(self) -> String {
        format!(
            "{}#{}",
            RECOMMENDATION_DOCS_PAGE,
            self.recommendation_id().to_ascii_lowercase()
        )
    }

    /// Artifact an incident responder should open first.
    pub fn primary_artifact_kind(self) -> PrimaryArtifactKind {
        match self {
            FailureClass::SelectiveContract => PrimaryArtifactKind::SelectiveDecisions,
            FailureClass::ValidatorContract => PrimaryArtifactKind::ValidatorContracts,
            FailureClass::ConfigContract => PrimaryArtifactKind::RuntimeConfigDiagnostics,
            _ => PrimaryArtifactKind::NotApplicable,
        }
    }

    pub fn from_recommendation_id(id: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.recommendation_id() == id)
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureClass {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| ContractError::UnknownVariant {
                kind: "failure class",
                value: s.to_string(),
            })
    }
}

/// One-line `QG-001 infra_artifact | QG-002 ...` legend for reports.
pub fn recommendation_quick_map() -> String {
    FailureClass::ALL
        .iter()
        .map(|class| format!("{} {}", class.recommendation_id(), class.as_str()))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Whether `value` looks like a recommendation id (`QG-` plus three digits).
pub fn is_recommendation_id(value: &str) -> bool {
    value.len() == 6
        && value.starts_with("QG-")
        && value[3..].bytes().all(|b| b.is_ascii_digit())
}

/// Artifact kind paired with a contract failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryArtifactKind {
    SelectiveDecisions,
    ValidatorContracts,
    RuntimeConfigDiagnostics,
    #[serde(rename = "none")]
    NotApplicable,
}

impl PrimaryArtifactKind {
    pub const ALL: [PrimaryArtifactKind; 4] = [
        PrimaryArtifactKind::SelectiveDecisions,
        PrimaryArtifactKind::ValidatorContracts,
        PrimaryArtifactKind::RuntimeConfigDiagnostics,
        PrimaryArtifactKind::NotApplicable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrimaryArtifactKind::SelectiveDecisions => "selective_decisions",
            PrimaryArtifactKind::ValidatorContracts => "validator_contracts",
            PrimaryArtifactKind::RuntimeConfigDiagnostics => "runtime_config_diagnostics",
            PrimaryArtifactKind::NotApplicable => "none",
        }
    }
}

impl FromStr for PrimaryArtifactKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ContractError::UnknownVariant {
                kind: "primary artifact kind",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for PrimaryArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of an artifact URL in an incident report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSource {
    /// URL passed verbatim by the caller.
    Explicit,
    /// URL derived from the workflow run URL and an artifact id.
    RunId,
    /// No URL; the responder falls back to the local artifact path.
    Fallback,
    #[serde(rename = "none")]
    NotAvailable,
}

impl ArtifactSource {
    pub const ALL: [ArtifactSource; 4] = [
        ArtifactSource::Explicit,
        ArtifactSource::RunId,
        ArtifactSource::Fallback,
        ArtifactSource::NotAvailable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactSource::Explicit => "explicit",
            ArtifactSource::RunId => "run_id",
            ArtifactSource::Fallback => "fallback",
            ArtifactSource::NotAvailable => "none",
        }
    }

    /// `explicit` and `run_id` carry a URL; `fallback` and `none` must not.
    pub fn requires_url(self) -> bool {
        matches!(self, ArtifactSource::Explicit | ArtifactSource::RunId)
    }
}

impl FromStr for ArtifactSource {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| ContractError::UnknownVariant {
                kind: "artifact source",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream CI job outcome as exposed by the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobResult {
    #[default]
    Unknown,
    Success,
    Failure,
}

impl JobResult {
    /// Parse a job result string. Anything unrecognised (including
    /// `cancelled`/`skipped` and the empty string) is `Unknown`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => JobResult::Success,
            "failure" => JobResult::Failure,
            _ => JobResult::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobResult::Unknown => "unknown",
            JobResult::Success => "success",
            JobResult::Failure => "failure",
        }
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// 2. CHECK STATUS - shared fail > warning > pass precedence
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
}

impl CheckStatus {
    pub const ALL: [CheckStatus; 3] = [CheckStatus::Pass, CheckStatus::Fail, CheckStatus::Warning];

    /// Overall status from per-status counts. Used by every aggregate.
    pub fn from_counts(fail_count: usize, warning_count: usize) -> Self {
        if fail_count > 0 {
            CheckStatus::Fail
        } else if warning_count > 0 {
            CheckStatus::Warning
        } else {
            CheckStatus::Pass
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Warning => "warning",
        }
    }
}

impl FromStr for CheckStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ContractError::UnknownVariant {
                kind: "check status",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// 3. SELECTIVE DECISIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Run,
    Skip,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Run => "run",
            Decision::Skip => "skip",
        }
    }
}

/// Run/skip decision of one selectively-executed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectiveDecision {
    pub contract_version: u32,
    pub check: String,
    pub decision: Decision,
    pub should_run: bool,
    pub reason: String,
    pub changed_files_scanned: u64,
    pub relevant_matches: u64,
    pub matched_files: Vec<String>,
    pub dry_run: bool,
    pub targeted_tests: u64,
}

/// Selective decisions merged by the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectiveDecisionsAggregate {
    pub schema_version: u32,
    pub decisions: Vec<SelectiveDecision>,
    pub warnings: Vec<String>,
}

impl SelectiveDecisionsAggregate {
    pub fn new(decisions: Vec<SelectiveDecision>, warnings: Vec<String>) -> Self {
        Self {
            schema_version: SELECTIVE_DECISIONS_SCHEMA_VERSION,
            decisions,
            warnings,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let aggregate: Self = serde_json::from_str(raw)?;
        check_version(
            "selective decisions",
            SELECTIVE_DECISIONS_SCHEMA_VERSION,
            aggregate.schema_version,
        )?;
        Ok(aggregate)
    }
}

// ============================================================================
// 4. VALIDATOR CONTRACTS SUMMARY
// ============================================================================

/// Outcome of one named validator check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub id: String,
    pub title: String,
    pub file: String,
    pub status: CheckStatus,
    pub ok: bool,
    pub error_count: usize,
    pub error_codes: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorContractsSummary {
    pub schema_version: u32,
    pub overall_status: CheckStatus,
    pub check_count: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub warning_count: usize,
    pub total_errors: usize,
    pub error_codes: Vec<String>,
    pub checks: Vec<CheckSummary>,
}

impl ValidatorContractsSummary {
    /// Derive every aggregate field from `checks`.
    pub fn from_checks(checks: Vec<CheckSummary>) -> Self {
        let count = |status: CheckStatus| checks.iter().filter(|c| c.status == status).count();
        let pass_count = count(CheckStatus::Pass);
        let fail_count = count(CheckStatus::Fail);
        let warning_count = count(CheckStatus::Warning);
        let total_errors = checks.iter().map(|c| c.error_count).sum();
        let error_codes = unique_in_order(checks.iter().flat_map(|c| c.error_codes.iter()));

        Self {
            schema_version: VALIDATOR_CONTRACTS_SUMMARY_SCHEMA_VERSION,
            overall_status: CheckStatus::from_counts(fail_count, warning_count),
            check_count: checks.len(),
            pass_count,
            fail_count,
            warning_count,
            total_errors,
            error_codes,
            checks,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let summary: Self = serde_json::from_str(raw)?;
        check_version(
            "validator contracts summary",
            VALIDATOR_CONTRACTS_SUMMARY_SCHEMA_VERSION,
            summary.schema_version,
        )?;
        Ok(summary)
    }
}

/// Trimmed, non-empty values in first-seen order without duplicates.
pub fn unique_in_order<'a, I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a S>,
    S: AsRef<str> + 'a + ?Sized,
{
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for value in values {
        let value = value.as_ref().trim();
        if !value.is_empty() && seen.insert(value.to_string()) {
            out.push(value.to_string());
        }
    }
    out
}

// ============================================================================
// 5. CI INCIDENT PAYLOAD
// ============================================================================

/// Machine-readable companion of the incident snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiIncidentPayload {
    pub schema_version: u32,
    pub failure_class: FailureClass,
    pub recommendation_id: String,
    pub workflow_run: String,
    pub branch_pr: String,
    pub output_file: String,
    pub markdown: String,
    pub artifact_url: String,
    pub artifact_source: ArtifactSource,
    pub validator_artifact_url: String,
    pub validator_artifact_source: ArtifactSource,
    pub runtime_artifact_url: String,
    pub runtime_artifact_source: ArtifactSource,
    pub primary_artifact_kind: PrimaryArtifactKind,
}

// ============================================================================
// 6. QUALITY SNAPSHOT
// ============================================================================

/// Machine-readable verdict of one quality gate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySnapshot {
    pub schema_version: u32,
    pub overall_ok: bool,
    /// Absent when the run is healthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_class: Option<FailureClass>,
    /// `null` when the run is healthy.
    pub recommendation_id: Option<String>,
    pub lint_ok: bool,
    pub smoke_ok: bool,
    pub lint_job_result: JobResult,
    pub smoke_job_result: JobResult,
    pub smoke_duration_seconds: f64,
    pub smoke_duration_budget_seconds: f64,
    pub smoke_duration_over_budget: bool,
    pub budget_blocking: bool,
    pub inconsistencies: Vec<String>,
    pub smoke_suite_files: Vec<String>,
    pub smoke_suite_baseline_provided: bool,
    pub smoke_suite_added_files: Vec<String>,
    pub smoke_suite_removed_files: Vec<String>,
    pub selective_decisions: Vec<SelectiveDecision>,
    pub selective_decision_warnings: Vec<String>,
    pub selective_decisions_aggregate_issue: bool,
    pub runtime_config_diagnostics_ok: Option<bool>,
    pub runtime_config_diagnostics_warnings: Vec<String>,
    pub runtime_config_diagnostics_issue: bool,
    pub validator_contracts_summary_validation_ok: Option<bool>,
    pub validator_contracts_summary_validation_warnings: Vec<String>,
    pub validator_contracts_summary_validation_issue: bool,
}

// ============================================================================
// 7. RUNTIME CONFIG DIAGNOSTICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeDiagnostic {
    pub code: String,
    pub severity: DiagnosticSeverity,
    pub message: String,
}

/// Report produced by the app's runtime configuration check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfigDiagnostics {
    pub schema_version: u32,
    pub ok: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub diagnostics: Vec<RuntimeDiagnostic>,
}

impl RuntimeConfigDiagnostics {
    pub fn from_json(raw: &str) -> Result<Self> {
        let diagnostics: Self = serde_json::from_str(raw)?;
        check_version(
            "runtime config diagnostics",
            RUNTIME_CONFIG_DIAGNOSTICS_SCHEMA_VERSION,
            diagnostics.schema_version,
        )?;
        Ok(diagnostics)
    }

    /// Violations of the count/ok invariants, as messages.
    pub fn inconsistencies(&self) -> Vec<String> {
        let severity_count = |severity: DiagnosticSeverity| {
            self.diagnostics
                .iter()
                .filter(|d| d.severity == severity)
                .count()
        };
        let errors = severity_count(DiagnosticSeverity::Error);
        let warnings = severity_count(DiagnosticSeverity::Warning);

        let mut out = Vec::new();
        if self.error_count != errors {
            out.push(format!(
                "errorCount ({}) does not match error diagnostics ({}).",
                self.error_count, errors
            ));
        }
        if self.warning_count != warnings {
            out.push(format!(
                "warningCount ({}) does not match warning diagnostics ({}).",
                self.warning_count, warnings
            ));
        }
        if self.ok != (self.error_count == 0) {
            out.push(format!(
                "ok ({}) does not match errorCount ({}).",
                self.ok, self.error_count
            ));
        }
        out
    }
}

// ============================================================================
// 8. UPSTREAM REPORTS (lint tool + test runner)
// ============================================================================

/// Deserialize `null` like a missing field.
///
/// Upstream tools emit `null` for counts and timestamps they could not
/// compute; one such entry must not discard the whole report.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of the lint tool's JSON report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LintFileReport {
    #[serde(deserialize_with = "null_as_default")]
    pub file_path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub error_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub warning_count: u64,
}

/// Test runner JSON report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestRunReport {
    #[serde(deserialize_with = "null_as_default")]
    pub num_total_test_suites: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub num_failed_test_suites: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub num_total_tests: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub num_failed_tests: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub test_results: Vec<TestFileResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestFileResult {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub status: Option<String>,
    /// Epoch milliseconds.
    #[serde(deserialize_with = "null_as_default")]
    pub start_time: f64,
    /// Epoch milliseconds.
    #[serde(deserialize_with = "null_as_default")]
    pub end_time: f64,
}

impl TestRunReport {
    /// Σ(endTime − startTime) over all suites, in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.test_results
            .iter()
            .map(|r| r.end_time - r.start_time)
            .sum()
    }
}

// ============================================================================
// 9. SMOKE SUITE BASELINE RECOMMENDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmokeSuiteBaselineRecommendation {
    pub schema_version: u32,
    pub current_files: Vec<String>,
    pub baseline_files: Vec<String>,
    pub added_files: Vec<String>,
    pub removed_files: Vec<String>,
    pub changed: bool,
    pub recommended_baseline: String,
}

impl SmokeSuiteBaselineRecommendation {
    /// Build from raw file lists; both are sorted and de-duplicated.
    pub fn from_files<I, J>(current: I, baseline: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        let current: BTreeSet<String> = current.into_iter().collect();
        let baseline: BTreeSet<String> = baseline.into_iter().collect();
        let added_files: Vec<String> = current.difference(&baseline).cloned().collect();
        let removed_files: Vec<String> = baseline.difference(&current).cloned().collect();
        let current_files: Vec<String> = current.into_iter().collect();

        Self {
            schema_version: SMOKE_SUITE_BASELINE_SCHEMA_VERSION,
            changed: !added_files.is_empty() || !removed_files.is_empty(),
            recommended_baseline: current_files.join(","),
            current_files,
            baseline_files: baseline.into_iter().collect(),
            added_files,
            removed_files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(id: &str, status: CheckStatus, codes: &[&str]) -> CheckSummary {
        CheckSummary {
            id: id.to_string(),
            title: id.to_string(),
            file: format!("{}-validation.json", id),
            status,
            ok: status == CheckStatus::Pass,
            error_count: codes.len(),
            error_codes: codes.iter().map(|c| c.to_string()).collect(),
            reason: String::new(),
        }
    }

    #[test]
    fn test_failure_class_round_trips_through_str() {
        for class in FailureClass::ALL {
            assert_eq!(class.as_str().parse::<FailureClass>().unwrap(), class);
            let json = serde_json::to_string(&class).unwrap();
            assert_eq!(json, format!("\"{}\"", class.as_str()));
        }
        assert!("pass".parse::<FailureClass>().is_err());
    }

    #[test]
    fn test_docs_anchor_uses_lowercase_id() {
        assert_eq!(
            FailureClass::ConfigContract.docs_anchor(),
            "docs/TESTING.md#qg-009"
        );
    }

    #[test]
    fn test_primary_artifact_kind_only_for_contract_classes() {
        assert_eq!(
            FailureClass::SelectiveContract.primary_artifact_kind(),
            PrimaryArtifactKind::SelectiveDecisions
        );
        assert_eq!(
            FailureClass::Mixed.primary_artifact_kind(),
            PrimaryArtifactKind::NotApplicable
        );
        assert_eq!(
            serde_json::to_string(&PrimaryArtifactKind::NotApplicable).unwrap(),
            "\"none\""
        );
    }

    #[test]
    fn test_artifact_source_serializes_none() {
        assert_eq!(
            serde_json::to_string(&ArtifactSource::NotAvailable).unwrap(),
            "\"none\""
        );
        assert_eq!(
            "run_id".parse::<ArtifactSource>().unwrap(),
            ArtifactSource::RunId
        );
        assert!(ArtifactSource::RunId.requires_url());
        assert!(!ArtifactSource::Fallback.requires_url());
    }

    #[test]
    fn test_job_result_parse_is_lenient() {
        assert_eq!(JobResult::parse_lenient(" SUCCESS "), JobResult::Success);
        assert_eq!(JobResult::parse_lenient("failure"), JobResult::Failure);
        assert_eq!(JobResult::parse_lenient("cancelled"), JobResult::Unknown);
        assert_eq!(JobResult::parse_lenient(""), JobResult::Unknown);
    }

    #[test]
    fn test_recommendation_id_shape() {
        assert!(is_recommendation_id("QG-007"));
        assert!(!is_recommendation_id("QG-07"));
        assert!(!is_recommendation_id("QG-00a"));
        assert!(!is_recommendation_id("<from Quality Gate Summary>"));
    }

    #[test]
    fn test_summary_from_checks_derives_counts() {
        let summary = ValidatorContractsSummary::from_checks(vec![
            check("a", CheckStatus::Pass, &[]),
            check("b", CheckStatus::Fail, &["X", "Y"]),
            check("c", CheckStatus::Warning, &["Y", "Z"]),
        ]);
        assert_eq!(summary.check_count, 3);
        assert_eq!(summary.pass_count, 1);
        assert_eq!(summary.fail_count, 1);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.total_errors, 4);
        assert_eq!(summary.overall_status, CheckStatus::Fail);
        assert_eq!(summary.error_codes, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_summary_from_json_rejects_other_versions() {
        let mut summary = ValidatorContractsSummary::from_checks(vec![]);
        summary.schema_version = 2;
        let raw = serde_json::to_string(&summary).unwrap();
        let err = ValidatorContractsSummary::from_json(&raw).unwrap_err();
        assert!(matches!(err, ContractError::UnsupportedVersion { found: 2, .. }));
    }

    #[test]
    fn test_baseline_recommendation_drift() {
        let rec = SmokeSuiteBaselineRecommendation::from_files(
            vec!["b.test.ts".to_string(), "a.test.ts".to_string(), "a.test.ts".to_string()],
            vec!["c.test.ts".to_string(), "a.test.ts".to_string()],
        );
        assert_eq!(rec.current_files, vec!["a.test.ts", "b.test.ts"]);
        assert_eq!(rec.added_files, vec!["b.test.ts"]);
        assert_eq!(rec.removed_files, vec!["c.test.ts"]);
        assert!(rec.changed);
        assert_eq!(rec.recommended_baseline, "a.test.ts,b.test.ts");
    }

    #[test]
    fn test_runtime_diagnostics_inconsistencies() {
        let diagnostics = RuntimeConfigDiagnostics {
            schema_version: 1,
            ok: true,
            error_count: 0,
            warning_count: 0,
            diagnostics: vec![RuntimeDiagnostic {
                code: "API_URL_MISSING".to_string(),
                severity: DiagnosticSeverity::Error,
                message: "missing".to_string(),
            }],
        };
        assert_eq!(diagnostics.inconsistencies().len(), 1);
    }

    #[test]
    fn test_reports_treat_null_fields_as_zero() {
        let lint: Vec<LintFileReport> = serde_json::from_str(
            r#"[{"filePath": "src/a.ts", "errorCount": null, "warningCount": 2},
                {"filePath": null}]"#,
        )
        .unwrap();
        assert_eq!(lint[0].error_count, 0);
        assert_eq!(lint[0].warning_count, 2);
        assert_eq!(lint[1], LintFileReport::default());

        let report: TestRunReport = serde_json::from_str(
            r#"{"numTotalTests": 4, "numFailedTests": null,
                "testResults": [
                    {"name": "a.test.ts", "startTime": null, "endTime": 1500},
                    {"name": "b.test.ts", "startTime": 1000, "endTime": 3000}
                ]}"#,
        )
        .unwrap();
        assert_eq!(report.num_total_tests, 4);
        assert_eq!(report.num_failed_tests, 0);
        assert_eq!(report.test_results[0].start_time, 0.0);
        assert_eq!(report.duration_ms(), 3500.0);

        let empty: TestRunReport = serde_json::from_str(r#"{"testResults": null}"#).unwrap();
        assert!(empty.test_results.is_empty());
    }
}
