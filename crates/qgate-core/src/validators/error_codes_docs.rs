//! Error-codes table embedded in the testing docs.

use qgate_domain::error_codes::{
    error_codes_docs as codes, render_docs_table, DOCS_TABLE_END, DOCS_TABLE_START,
};
use qgate_domain::{Namespace, ValidationError, REGISTRY};

use super::{ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::Result;

pub struct ErrorCodesDocsValidator;

impl ArtifactValidator for ErrorCodesDocsValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::ErrorCodesDocs
    }

    fn title(&self) -> &'static str {
        "Error codes docs"
    }

    fn default_file(&self) -> Option<&'static str> {
        Some("docs/TESTING.md")
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        Ok(validate_detailed(&input.content, REGISTRY))
    }
}

/// Text between the start and end markers, if both are present in order.
pub fn extract_table(docs: &str) -> Option<&str> {
    let start = docs.find(DOCS_TABLE_START)? + DOCS_TABLE_START.len();
    let end = docs[start..].find(DOCS_TABLE_END)? + start;
    Some(&docs[start..end])
}

pub fn validate_detailed(docs: &str, registry: &[Namespace]) -> Vec<ValidationError> {
    let Some(actual) = extract_table(docs) else {
        return vec![ValidationError::new(
            codes::MISSING_MARKERS,
            "markers",
            format!(
                "Docs must contain {} followed by {}.",
                DOCS_TABLE_START, DOCS_TABLE_END
            ),
        )];
    };

    if actual.trim() != render_docs_table(registry).trim() {
        return vec![ValidationError::new(
            codes::OUTDATED_TABLE,
            "table",
            "Error codes table is outdated; replace it with the output of `qgate render-error-codes-table`.",
        )];
    }
    Vec::new()
}
