//! Per-artifact validators.
//!
//! Each validator implements [`ArtifactValidator`]: it loads its own input,
//! reports every contract violation as a [`ValidationError`], and names the
//! messages printed by [`qgate_domain::emit_result`]. [`validator_for`] is
//! the explicit kind → validator table.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;

use qgate_domain::{build_result, emit_result, OutputMode, ValidationError, ValidatorOutput};

use crate::context::{EnvSnapshot, RunContext};
use crate::error::{QgateError, Result};
use crate::{io, obs};

pub mod ci_incident_payload;
pub mod ci_incident_snippet;
pub mod error_codes_docs;
pub mod error_codes_policy;
pub mod json;
pub mod pr_ci_exception;
pub mod quality_summary;
pub mod selective_decision;
pub mod selective_decisions;
pub mod smoke_suite_baseline;
pub mod validator_contracts_summary;
pub mod validator_guard_comment;
pub mod workflow_contract;

// ----------------------------------------------------------------------------
// Artifact kinds
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    SelectiveDecision,
    SelectiveDecisions,
    CiIncidentPayload,
    CiIncidentSnippet,
    ValidatorGuardComment,
    ValidatorContractsSummary,
    ErrorCodesDocs,
    ErrorCodesPolicy,
    WorkflowContract,
    PrCiException,
    SmokeSuiteBaseline,
    QualitySummary,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 12] = [
        ArtifactKind::SelectiveDecision,
        ArtifactKind::SelectiveDecisions,
        ArtifactKind::CiIncidentPayload,
        ArtifactKind::CiIncidentSnippet,
        ArtifactKind::ValidatorGuardComment,
        ArtifactKind::ValidatorContractsSummary,
        ArtifactKind::ErrorCodesDocs,
        ArtifactKind::ErrorCodesPolicy,
        ArtifactKind::WorkflowContract,
        ArtifactKind::PrCiException,
        ArtifactKind::SmokeSuiteBaseline,
        ArtifactKind::QualitySummary,
    ];

    /// CLI name, also the check id used by the contracts summarizer.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::SelectiveDecision => "selective-decision",
            ArtifactKind::SelectiveDecisions => "selective-decisions",
            ArtifactKind::CiIncidentPayload => "ci-incident-payload",
            ArtifactKind::CiIncidentSnippet => "ci-incident-snippet",
            ArtifactKind::ValidatorGuardComment => "validator-guard-comment",
            ArtifactKind::ValidatorContractsSummary => "validator-contracts-summary",
            ArtifactKind::ErrorCodesDocs => "error-codes-docs",
            ArtifactKind::ErrorCodesPolicy => "error-codes-policy",
            ArtifactKind::WorkflowContract => "workflow-contract",
            ArtifactKind::PrCiException => "pr-ci-exception",
            ArtifactKind::SmokeSuiteBaseline => "smoke-suite-baseline",
            ArtifactKind::QualitySummary => "quality-summary",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.as_str()).collect()
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = QgateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| QgateError::InvalidInput(format!("unknown artifact kind: {}", s)))
    }
}

// ----------------------------------------------------------------------------
// Validator trait
// ----------------------------------------------------------------------------

/// Content handed to a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorInput {
    /// Path as given by the caller, recorded in the output.
    pub file: Option<String>,
    pub content: String,
}

pub trait ArtifactValidator {
    fn kind(&self) -> ArtifactKind;

    /// `"<Title> validation"`; success and failure lines derive from it.
    fn title(&self) -> &'static str;

    /// File read when the caller passes none.
    fn default_file(&self) -> Option<&'static str>;

    /// Contract violations found in `input`.
    ///
    /// `Err` is reserved for fatal problems with the input source itself.
    fn validate(&self, env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>>;

    /// Load the artifact. Defaults to reading `file` (or the default file).
    fn load_input(&self, env: &EnvSnapshot, file: Option<&str>) -> Result<ValidatorInput> {
        let file = file.or(self.default_file()).ok_or_else(|| {
            QgateError::InvalidInput(format!("{}: --file is required", self.failure_prefix()))
        })?;
        Ok(ValidatorInput {
            file: Some(file.to_string()),
            content: io::read_text(&env.resolve(file))?,
        })
    }

    /// Extra top-level fields on the output (`supportedSchemaVersion`, ...).
    fn extra(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    fn failure_prefix(&self) -> String {
        format!("{} validation", self.title())
    }

    fn success_message(&self) -> String {
        format!("{} validation: passed.", self.title())
    }

    /// Load, validate and build the output without printing.
    fn check(&self, env: &EnvSnapshot, file: Option<&str>) -> Result<ValidatorOutput> {
        let input = self.load_input(env, file)?;
        let errors = self.validate(env, &input)?;
        let mut result = build_result(input.file.as_deref(), errors);
        for (key, value) in self.extra() {
            result.extra.insert(key.to_string(), value);
        }
        obs::emit_validator_finished(self.kind().as_str(), result.ok, result.error_count);
        Ok(result)
    }
}

/// Explicit kind → validator table.
pub fn validator_for(kind: ArtifactKind) -> &'static dyn ArtifactValidator {
    match kind {
        ArtifactKind::SelectiveDecision => &selective_decision::SelectiveDecisionValidator,
        ArtifactKind::SelectiveDecisions => &selective_decisions::SelectiveDecisionsValidator,
        ArtifactKind::CiIncidentPayload => &ci_incident_payload::CiIncidentPayloadValidator,
        ArtifactKind::CiIncidentSnippet => &ci_incident_snippet::CiIncidentSnippetValidator,
        ArtifactKind::ValidatorGuardComment => {
            &validator_guard_comment::ValidatorGuardCommentValidator
        }
        ArtifactKind::ValidatorContractsSummary => {
            &validator_contracts_summary::ValidatorContractsSummaryValidator
        }
        ArtifactKind::ErrorCodesDocs => &error_codes_docs::ErrorCodesDocsValidator,
        ArtifactKind::ErrorCodesPolicy => &error_codes_policy::ErrorCodesPolicyValidator,
        ArtifactKind::WorkflowContract => &workflow_contract::WorkflowContractValidator,
        ArtifactKind::PrCiException => &pr_ci_exception::PrCiExceptionValidator,
        ArtifactKind::SmokeSuiteBaseline => &smoke_suite_baseline::SmokeSuiteBaselineValidator,
        ArtifactKind::QualitySummary => &quality_summary::QualitySummaryValidator,
    }
}

/// Options of one `validate` invocation.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    pub file: Option<String>,
    pub mode: OutputMode,
    /// Also persist the [`ValidatorOutput`] here, whatever the mode.
    pub json_output: Option<String>,
}

/// Run a validator end to end and return the process exit status.
pub fn run_validator<W: Write>(
    validator: &dyn ArtifactValidator,
    ctx: &mut RunContext<W>,
    options: &ValidateOptions,
) -> Result<i32> {
    let result = validator.check(&ctx.env, options.file.as_deref())?;
    if let Some(path) = options.json_output.as_deref() {
        io::write_json_pretty(&ctx.env.resolve(path), &result)?;
    }
    Ok(emit_result(
        &result,
        options.mode,
        &validator.success_message(),
        &validator.failure_prefix(),
        &mut ctx.out,
    ))
}

/// Validate a file through the table, for callers that only need the output.
pub fn check_file(kind: ArtifactKind, env: &EnvSnapshot, path: &Path) -> Result<ValidatorOutput> {
    let file = path.to_string_lossy().to_string();
    validator_for(kind).check(env, Some(&file))
}
