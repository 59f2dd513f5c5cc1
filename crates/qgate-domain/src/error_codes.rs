//! Error taxonomy registry.
//!
//! Every validation error carries a stable string code. Codes are grouped
//! into namespaces; each namespace declares the prefix all of its codes must
//! carry, and every code must be unique across the whole registry (both
//! rules are enforced by the error-codes policy validator, not by the
//! compiler).
//!
//! The registry is declared once with [`error_codes!`]: the macro emits one
//! module of `&str` constants per namespace (for typed access from the
//! validators) and the iterable [`REGISTRY`] table (for the policy and docs
//! validators).

/// One namespace of the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    /// Namespace name as it appears in docs (`validatorContractsSummary`).
    pub name: &'static str,
    /// Prefix every code in this namespace must start with.
    pub prefix: &'static str,
    /// `(key, code)` pairs in declaration order.
    pub entries: &'static [(&'static str, &'static str)],
}

impl Namespace {
    /// Look up a code by key.
    pub fn code(&self, key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, code)| *code)
    }
}

macro_rules! error_codes {
    ($(
        $(#[$meta:meta])*
        $module:ident => $name:literal, prefix = $prefix:literal {
            $( $key:ident = $code:literal ),+ $(,)?
        }
    )+) => {
        $(
            $(#[$meta])*
            pub mod $module {
                $( pub const $key: &str = $code; )+
            }
        )+

        /// Every namespace, in declaration order.
        pub const REGISTRY: &[Namespace] = &[
            $(
                Namespace {
                    name: $name,
                    prefix: $prefix,
                    entries: &[ $( (stringify!($key), $code) ),+ ],
                },
            )+
        ];
    };
}

error_codes! {
    /// Fallback codes shared by every validator.
    common => "common", prefix = "VALIDATION_" {
        ERROR = "VALIDATION_ERROR",
    }

    /// One per-check selective decision file.
    selective_decision => "selectiveDecision", prefix = "SELECTIVE_DECISION_" {
        INVALID_JSON = "SELECTIVE_DECISION_INVALID_JSON",
        INVALID_PAYLOAD_OBJECT = "SELECTIVE_DECISION_INVALID_PAYLOAD_OBJECT",
        INVALID_CONTRACT_VERSION = "SELECTIVE_DECISION_INVALID_CONTRACT_VERSION",
        INVALID_CHECK = "SELECTIVE_DECISION_INVALID_CHECK",
        INVALID_DECISION = "SELECTIVE_DECISION_INVALID_DECISION",
        INVALID_SHOULD_RUN = "SELECTIVE_DECISION_INVALID_SHOULD_RUN",
        DECISION_MISMATCH = "SELECTIVE_DECISION_DECISION_MISMATCH",
        INVALID_REASON = "SELECTIVE_DECISION_INVALID_REASON",
        INVALID_COUNT_FIELD = "SELECTIVE_DECISION_INVALID_COUNT_FIELD",
        INVALID_MATCHED_FILES = "SELECTIVE_DECISION_INVALID_MATCHED_FILES",
        MATCH_COUNT_MISMATCH = "SELECTIVE_DECISION_MATCH_COUNT_MISMATCH",
        INVALID_DRY_RUN = "SELECTIVE_DECISION_INVALID_DRY_RUN",
    }

    /// The collected selective decisions aggregate.
    selective_decisions => "selectiveDecisions", prefix = "SELECTIVE_DECISIONS_" {
        INVALID_JSON = "SELECTIVE_DECISIONS_INVALID_JSON",
        INVALID_PAYLOAD_OBJECT = "SELECTIVE_DECISIONS_INVALID_PAYLOAD_OBJECT",
        INVALID_SCHEMA_VERSION = "SELECTIVE_DECISIONS_INVALID_SCHEMA_VERSION",
        INVALID_DECISIONS_ARRAY = "SELECTIVE_DECISIONS_INVALID_DECISIONS_ARRAY",
        INVALID_DECISION_ENTRY = "SELECTIVE_DECISIONS_INVALID_DECISION_ENTRY",
        DUPLICATE_CHECK = "SELECTIVE_DECISIONS_DUPLICATE_CHECK",
        INVALID_WARNINGS_ARRAY = "SELECTIVE_DECISIONS_INVALID_WARNINGS_ARRAY",
    }

    /// Machine-readable incident payload.
    ci_incident_payload => "ciIncidentPayload", prefix = "CI_INCIDENT_PAYLOAD_" {
        INVALID_JSON = "CI_INCIDENT_PAYLOAD_INVALID_JSON",
        INVALID_PAYLOAD_OBJECT = "CI_INCIDENT_PAYLOAD_INVALID_PAYLOAD_OBJECT",
        INVALID_SCHEMA_VERSION = "CI_INCIDENT_PAYLOAD_INVALID_SCHEMA_VERSION",
        INVALID_FAILURE_CLASS = "CI_INCIDENT_PAYLOAD_INVALID_FAILURE_CLASS",
        INVALID_RECOMMENDATION_ID = "CI_INCIDENT_PAYLOAD_INVALID_RECOMMENDATION_ID",
        RECOMMENDATION_MISMATCH = "CI_INCIDENT_PAYLOAD_RECOMMENDATION_MISMATCH",
        INVALID_PRIMARY_ARTIFACT_KIND = "CI_INCIDENT_PAYLOAD_INVALID_PRIMARY_ARTIFACT_KIND",
        INCONSISTENT_PRIMARY_ARTIFACT_KIND = "CI_INCIDENT_PAYLOAD_INCONSISTENT_PRIMARY_ARTIFACT_KIND",
        INVALID_ARTIFACT_SOURCE = "CI_INCIDENT_PAYLOAD_INVALID_ARTIFACT_SOURCE",
        INCONSISTENT_ARTIFACT_SOURCE = "CI_INCIDENT_PAYLOAD_INCONSISTENT_ARTIFACT_SOURCE",
        INCONSISTENT_ARTIFACT_URL = "CI_INCIDENT_PAYLOAD_INCONSISTENT_ARTIFACT_URL",
        INVALID_STRING_FIELD = "CI_INCIDENT_PAYLOAD_INVALID_STRING_FIELD",
        INVALID_MARKDOWN = "CI_INCIDENT_PAYLOAD_INVALID_MARKDOWN",
        MARKDOWN_ARTIFACT_MISMATCH = "CI_INCIDENT_PAYLOAD_MARKDOWN_ARTIFACT_MISMATCH",
    }

    /// Human-readable incident snippet (markdown).
    ci_incident_snippet => "ciIncidentSnippet", prefix = "CI_INCIDENT_SNIPPET_" {
        EMPTY = "CI_INCIDENT_SNIPPET_EMPTY",
        MISSING_HEADING = "CI_INCIDENT_SNIPPET_MISSING_HEADING",
        MISSING_FIELD = "CI_INCIDENT_SNIPPET_MISSING_FIELD",
        DUPLICATE_FIELD = "CI_INCIDENT_SNIPPET_DUPLICATE_FIELD",
        INVALID_FAILURE_CLASS = "CI_INCIDENT_SNIPPET_INVALID_FAILURE_CLASS",
        INVALID_RECOMMENDATION_ID = "CI_INCIDENT_SNIPPET_INVALID_RECOMMENDATION_ID",
        RECOMMENDATION_MISMATCH = "CI_INCIDENT_SNIPPET_RECOMMENDATION_MISMATCH",
        INVALID_TIMESTAMP = "CI_INCIDENT_SNIPPET_INVALID_TIMESTAMP",
        INVALID_ARTIFACT_LINE = "CI_INCIDENT_SNIPPET_INVALID_ARTIFACT_LINE",
    }

    /// PR comment posted by the validator guard.
    validator_guard_comment => "validatorGuardComment", prefix = "VALIDATOR_GUARD_COMMENT_" {
        EMPTY = "VALIDATOR_GUARD_COMMENT_EMPTY",
        MISSING_MARKER = "VALIDATOR_GUARD_COMMENT_MISSING_MARKER",
        DUPLICATE_MARKER = "VALIDATOR_GUARD_COMMENT_DUPLICATE_MARKER",
        MISSING_HEADING = "VALIDATOR_GUARD_COMMENT_MISSING_HEADING",
        INVALID_STATUS = "VALIDATOR_GUARD_COMMENT_INVALID_STATUS",
        INVALID_COUNTS = "VALIDATOR_GUARD_COMMENT_INVALID_COUNTS",
        COUNT_MISMATCH = "VALIDATOR_GUARD_COMMENT_COUNT_MISMATCH",
        STATUS_MISMATCH = "VALIDATOR_GUARD_COMMENT_STATUS_MISMATCH",
    }

    /// Validator contracts summary built by the summarizer.
    validator_contracts_summary => "validatorContractsSummary", prefix = "VALIDATOR_CONTRACTS_SUMMARY_" {
        INVALID_JSON = "VALIDATOR_CONTRACTS_SUMMARY_INVALID_JSON",
        INVALID_PAYLOAD_OBJECT = "VALIDATOR_CONTRACTS_SUMMARY_INVALID_PAYLOAD_OBJECT",
        INVALID_SCHEMA_VERSION = "VALIDATOR_CONTRACTS_SUMMARY_INVALID_SCHEMA_VERSION",
        INVALID_OVERALL_STATUS = "VALIDATOR_CONTRACTS_SUMMARY_INVALID_OVERALL_STATUS",
        INVALID_COUNT_FIELD = "VALIDATOR_CONTRACTS_SUMMARY_INVALID_COUNT_FIELD",
        INVALID_CHECKS_ARRAY = "VALIDATOR_CONTRACTS_SUMMARY_INVALID_CHECKS_ARRAY",
        INVALID_ERROR_CODES_ARRAY = "VALIDATOR_CONTRACTS_SUMMARY_INVALID_ERROR_CODES_ARRAY",
        INVALID_CHECK_ENTRY = "VALIDATOR_CONTRACTS_SUMMARY_INVALID_CHECK_ENTRY",
        COUNT_MISMATCH = "VALIDATOR_CONTRACTS_SUMMARY_COUNT_MISMATCH",
        STATUS_MISMATCH = "VALIDATOR_CONTRACTS_SUMMARY_STATUS_MISMATCH",
        ERROR_CODES_MISMATCH = "VALIDATOR_CONTRACTS_SUMMARY_ERROR_CODES_MISMATCH",
    }

    /// Error-codes table embedded in the docs.
    error_codes_docs => "errorCodesDocs", prefix = "ERROR_CODES_DOCS_" {
        MISSING_MARKERS = "ERROR_CODES_DOCS_MISSING_MARKERS",
        OUTDATED_TABLE = "ERROR_CODES_DOCS_OUTDATED_TABLE",
    }

    /// Prefix and uniqueness policy over this registry.
    error_codes_policy => "errorCodesPolicy", prefix = "ERROR_CODES_POLICY_" {
        MISSING_PREFIX = "ERROR_CODES_POLICY_MISSING_PREFIX",
        PREFIX_MISMATCH = "ERROR_CODES_POLICY_PREFIX_MISMATCH",
        DUPLICATE_VALUE = "ERROR_CODES_POLICY_DUPLICATE_VALUE",
    }

    /// Literal contract between the CI workflow file and the scripts.
    workflow_contract => "workflowContract", prefix = "WORKFLOW_CONTRACT_" {
        MISSING_ARTIFACT_NAME = "WORKFLOW_CONTRACT_MISSING_ARTIFACT_NAME",
        MISSING_ARTIFACT_PATH = "WORKFLOW_CONTRACT_MISSING_ARTIFACT_PATH",
        MISSING_STEP_ID = "WORKFLOW_CONTRACT_MISSING_STEP_ID",
        MISSING_OUTPUT_REFERENCE = "WORKFLOW_CONTRACT_MISSING_OUTPUT_REFERENCE",
        MISSING_SUMMARY_SETTING = "WORKFLOW_CONTRACT_MISSING_SUMMARY_SETTING",
    }

    /// CI exception block in a pull-request description.
    pr_ci_exception => "prCiException", prefix = "PR_CI_EXCEPTION_" {
        EMPTY_BODY = "PR_CI_EXCEPTION_EMPTY_BODY",
        EXCEPTION_NOT_REQUESTED = "PR_CI_EXCEPTION_EXCEPTION_NOT_REQUESTED",
        MISSING_FIELD = "PR_CI_EXCEPTION_MISSING_FIELD",
        PLACEHOLDER_VALUE = "PR_CI_EXCEPTION_PLACEHOLDER_VALUE",
        INVALID_EXPIRY = "PR_CI_EXCEPTION_INVALID_EXPIRY",
    }

    /// Smoke-suite baseline recommendation.
    smoke_suite_baseline => "smokeSuiteBaseline", prefix = "SMOKE_SUITE_BASELINE_" {
        INVALID_JSON = "SMOKE_SUITE_BASELINE_INVALID_JSON",
        INVALID_PAYLOAD_OBJECT = "SMOKE_SUITE_BASELINE_INVALID_PAYLOAD_OBJECT",
        INVALID_SCHEMA_VERSION = "SMOKE_SUITE_BASELINE_INVALID_SCHEMA_VERSION",
        INVALID_FILE_LIST = "SMOKE_SUITE_BASELINE_INVALID_FILE_LIST",
        UNSORTED_FILE_LIST = "SMOKE_SUITE_BASELINE_UNSORTED_FILE_LIST",
        DRIFT_MISMATCH = "SMOKE_SUITE_BASELINE_DRIFT_MISMATCH",
        CHANGED_FLAG_MISMATCH = "SMOKE_SUITE_BASELINE_CHANGED_FLAG_MISMATCH",
        RECOMMENDED_BASELINE_MISMATCH = "SMOKE_SUITE_BASELINE_RECOMMENDED_BASELINE_MISMATCH",
    }

    /// Quality snapshot written by the quality gate.
    quality_summary => "qualitySummary", prefix = "QUALITY_SUMMARY_" {
        INVALID_JSON = "QUALITY_SUMMARY_INVALID_JSON",
        INVALID_PAYLOAD_OBJECT = "QUALITY_SUMMARY_INVALID_PAYLOAD_OBJECT",
        INVALID_SCHEMA_VERSION = "QUALITY_SUMMARY_INVALID_SCHEMA_VERSION",
        MISSING_FIELD = "QUALITY_SUMMARY_MISSING_FIELD",
        INVALID_FIELD = "QUALITY_SUMMARY_INVALID_FIELD",
        UNEXPECTED_FIELD = "QUALITY_SUMMARY_UNEXPECTED_FIELD",
        FAILURE_CLASS_MISMATCH = "QUALITY_SUMMARY_FAILURE_CLASS_MISMATCH",
        RECOMMENDATION_MISMATCH = "QUALITY_SUMMARY_RECOMMENDATION_MISMATCH",
    }
}

/// Marker that opens the generated table in the docs.
pub const DOCS_TABLE_START: &str = "<!-- error-codes-table:start -->";
/// Marker that closes the generated table in the docs.
pub const DOCS_TABLE_END: &str = "<!-- error-codes-table:end -->";

/// Find a namespace by name.
pub fn namespace(name: &str) -> Option<&'static Namespace> {
    REGISTRY.iter().find(|ns| ns.name == name)
}

/// Render the docs table for a registry, without the surrounding markers.
pub fn render_docs_table(registry: &[Namespace]) -> String {
    let mut table = String::from("| Namespace | Key | Code |\n| --- | --- | --- |\n");
    for ns in registry {
        for (key, code) in ns.entries {
            table.push_str(&format!("| {} | {} | `{}` |\n", ns.name, key, code));
        }
    }
    table
}

/// Render the docs table wrapped in its start/end markers.
pub fn render_docs_block(registry: &[Namespace]) -> String {
    format!(
        "{}\n{}{}\n",
        DOCS_TABLE_START,
        render_docs_table(registry),
        DOCS_TABLE_END
    )
}
