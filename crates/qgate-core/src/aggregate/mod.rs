//! Aggregators that merge several validated artifacts into one.
//!
//! Both degrade instead of failing: a source that is missing or invalid
//! becomes a warning (or a `warning` check) and the aggregate still builds.

pub mod contracts;
pub mod selective;

pub use contracts::{
    render_guard_comment, summarize_contracts, summarize_validator_contracts, SummarizeOptions,
    CONTRACT_CHECKS,
};
pub use selective::{
    collect_decisions, collect_selective_decisions, CollectOptions, SELECTIVE_SOURCES,
};
