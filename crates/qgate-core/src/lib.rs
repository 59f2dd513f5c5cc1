//! qgate Core Library
//!
//! Validators, aggregators and the quality gate decision engine. Every entry
//! point takes an injected [`RunContext`] instead of reading the process
//! environment.

pub mod aggregate;
pub mod context;
pub mod error;
pub mod incident;
pub mod io;
pub mod markdown;
pub mod obs;
pub mod quality_gate;
pub mod telemetry;
pub mod validators;

pub use aggregate::{
    collect_selective_decisions, render_guard_comment, summarize_contracts,
    summarize_validator_contracts, CollectOptions, SummarizeOptions,
};
pub use context::{EnvSnapshot, RunContext};
pub use error::{QgateError, Result};
pub use incident::{publish, PublishOptions};
pub use quality_gate::{
    classify, evaluate, summarize_quality_gate, GateEvaluation, GateInputs, GateOptions,
    GateSignals,
};
pub use telemetry::init_tracing;
pub use validators::{run_validator, validator_for, ArtifactKind, ArtifactValidator, ValidateOptions};

/// qgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
