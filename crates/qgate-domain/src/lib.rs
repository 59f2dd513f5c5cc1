//! qgate contract types
//!
//! The error taxonomy registry, the uniform validator output contract, and
//! every versioned artifact exchanged between the CI stages that qgate
//! validates.

pub mod error;
pub mod error_codes;
pub mod output;
pub mod schema;

pub use error::{ContractError, Result};
pub use error_codes::{Namespace, REGISTRY};
pub use output::{
    build_result, emit_result, OutputMode, ValidationError, ValidatorOutput,
    VALIDATOR_OUTPUT_CONTRACT_VERSION,
};
pub use schema::{
    recommendation_quick_map, ArtifactSource, CheckStatus, CheckSummary, CiIncidentPayload,
    Decision, FailureClass, JobResult, LintFileReport, PrimaryArtifactKind, QualitySnapshot,
    RuntimeConfigDiagnostics, SelectiveDecision, SelectiveDecisionsAggregate,
    SmokeSuiteBaselineRecommendation, TestRunReport, ValidatorContractsSummary,
};
