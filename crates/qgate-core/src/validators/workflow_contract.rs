//! Literal contract between the CI workflow file and qgate's commands.
//!
//! The workflow is read as opaque text; every required literal must appear
//! verbatim. A rename on either side shows up here before it breaks a run.

use qgate_domain::error_codes::workflow_contract as codes;
use qgate_domain::ValidationError;

use super::{ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::Result;

/// What kind of literal a requirement is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequirementCategory {
    ArtifactName,
    ArtifactPath,
    StepId,
    OutputReference,
    SummarySetting,
}

const ARTIFACT_NAMES: &[&str] = &[
    "name: eslint-results",
    "name: jest-smoke-results",
    "name: selective-decisions",
    "name: validator-contracts-summary-validation",
    "name: runtime-config-diagnostics",
    "name: quality-summary",
    "name: ci-incident-snippet",
];

const ARTIFACT_PATHS: &[&str] = &[
    "test-results/eslint-results.json",
    "test-results/jest-smoke-results.json",
    "test-results/selective-decisions.json",
    "test-results/validator-contracts-summary-validation.json",
    "test-results/runtime-config-diagnostics.json",
    "test-results/quality-summary.json",
    "test-results/ci-incident-snippet.md",
];

const STEP_IDS: &[&str] = &[
    "id: selective_decisions",
    "id: validator_contracts",
    "id: quality_gate",
    "id: incident_snippet",
];

const OUTPUT_REFERENCES: &[&str] = &[
    "needs.lint.result",
    "needs.smoke.result",
    "steps.quality_gate.outcome",
    "steps.validator_contracts.outcome",
];

const SUMMARY_SETTINGS: &[&str] = &[
    "LINT_JOB_RESULT:",
    "SMOKE_JOB_RESULT:",
    "SMOKE_DURATION_BUDGET_SECONDS:",
    "SMOKE_DURATION_BUDGET_STRICT:",
    "--fail-on-missing",
];

impl RequirementCategory {
    pub const ALL: [RequirementCategory; 5] = [
        RequirementCategory::ArtifactName,
        RequirementCategory::ArtifactPath,
        RequirementCategory::StepId,
        RequirementCategory::OutputReference,
        RequirementCategory::SummarySetting,
    ];

    pub fn literals(self) -> &'static [&'static str] {
        match self {
            RequirementCategory::ArtifactName => ARTIFACT_NAMES,
            RequirementCategory::ArtifactPath => ARTIFACT_PATHS,
            RequirementCategory::StepId => STEP_IDS,
            RequirementCategory::OutputReference => OUTPUT_REFERENCES,
            RequirementCategory::SummarySetting => SUMMARY_SETTINGS,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            RequirementCategory::ArtifactName => codes::MISSING_ARTIFACT_NAME,
            RequirementCategory::ArtifactPath => codes::MISSING_ARTIFACT_PATH,
            RequirementCategory::StepId => codes::MISSING_STEP_ID,
            RequirementCategory::OutputReference => codes::MISSING_OUTPUT_REFERENCE,
            RequirementCategory::SummarySetting => codes::MISSING_SUMMARY_SETTING,
        }
    }

    pub fn field(self) -> &'static str {
        match self {
            RequirementCategory::ArtifactName => "artifactName",
            RequirementCategory::ArtifactPath => "artifactPath",
            RequirementCategory::StepId => "stepId",
            RequirementCategory::OutputReference => "outputReference",
            RequirementCategory::SummarySetting => "summarySetting",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            RequirementCategory::ArtifactName => "artifact name",
            RequirementCategory::ArtifactPath => "artifact path",
            RequirementCategory::StepId => "step id",
            RequirementCategory::OutputReference => "output reference",
            RequirementCategory::SummarySetting => "summary setting",
        }
    }
}

pub struct WorkflowContractValidator;

impl ArtifactValidator for WorkflowContractValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::WorkflowContract
    }

    fn title(&self) -> &'static str {
        "Workflow contract"
    }

    fn default_file(&self) -> Option<&'static str> {
        Some(".github/workflows/ci.yml")
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        Ok(validate_detailed(&input.content))
    }
}

pub fn validate_detailed(workflow: &str) -> Vec<ValidationError> {
    RequirementCategory::ALL
        .iter()
        .flat_map(|category| {
            category
                .literals()
                .iter()
                .filter(|literal| !workflow.contains(**literal))
                .map(move |literal| {
                    ValidationError::new(
                        category.code(),
                        category.field(),
                        format!("Workflow is missing required {} `{}`.", category.describe(), literal),
                    )
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_workflow() -> String {
        RequirementCategory::ALL
            .iter()
            .flat_map(|c| c.literals().iter())
            .map(|literal| format!("      # {}\n", literal))
            .collect()
    }

    #[test]
    fn test_complete_workflow_passes() {
        assert!(validate_detailed(&complete_workflow()).is_empty());
    }

    #[test]
    fn test_each_category_reports_its_own_code() {
        for category in RequirementCategory::ALL {
            let literal = category.literals()[0];
            let workflow = complete_workflow().replace(&format!("# {}\n", literal), "\n");
            let errors = validate_detailed(&workflow);
            assert!(
                errors.iter().any(|e| e.code == category.code() && e.message.contains(literal)),
                "{:?}",
                category
            );
        }
    }

    #[test]
    fn test_empty_workflow_reports_every_literal() {
        let expected: usize = RequirementCategory::ALL.iter().map(|c| c.literals().len()).sum();
        assert_eq!(validate_detailed("").len(), expected);
    }
}
