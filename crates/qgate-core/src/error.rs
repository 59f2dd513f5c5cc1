//! Fatal errors for qgate operations.
//!
//! Contract violations are never errors here; they are collected as
//! [`qgate_domain::ValidationError`] values. Only I/O and malformed
//! configuration inputs become `Err`.

use std::path::PathBuf;

/// qgate fatal errors.
#[derive(Debug, thiserror::Error)]
pub enum QgateError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("contract error: {0}")]
    Contract(#[from] qgate_domain::ContractError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for qgate operations.
pub type Result<T> = std::result::Result<T, QgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_names_path() {
        let err = QgateError::FileNotFound {
            path: PathBuf::from("test-results/missing.json"),
        };
        assert_eq!(err.to_string(), "file not found: test-results/missing.json");
    }
}
