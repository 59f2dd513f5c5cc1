//! Error types for contract operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Unsupported {artifact} version: expected {expected}, got {found}")]
    UnsupportedVersion {
        artifact: &'static str,
        expected: u32,
        found: u64,
    },
}

/// Result type for contract operations
pub type Result<T> = std::result::Result<T, ContractError>;
