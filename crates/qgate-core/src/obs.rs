//! Structured observability events for qgate commands.
//!
//! Events are emitted at `info!` (or `warn!` for degradations) and carry an
//! `event` field so JSON log consumers can filter on it.

use tracing::{info, warn};

/// RAII guard that enters a command-scoped span.
pub struct CommandSpan {
    _span: tracing::span::EnteredSpan,
}

impl CommandSpan {
    pub fn enter(command: &str) -> Self {
        let span = tracing::info_span!("qgate.command", command = %command);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_validator_finished(kind: &str, ok: bool, error_count: usize) {
    info!(
        event = "validator.finished",
        kind = %kind,
        ok = ok,
        error_count = error_count,
    );
}

pub fn emit_aggregate_built(aggregate: &str, items: usize, warnings: usize) {
    info!(
        event = "aggregate.built",
        aggregate = %aggregate,
        items = items,
        warnings = warnings,
    );
}

pub fn emit_gate_evaluated(overall_ok: bool, failure_class: Option<&str>, exit_code: i32) {
    info!(
        event = "gate.evaluated",
        overall_ok = overall_ok,
        failure_class = failure_class.unwrap_or("none"),
        exit_code = exit_code,
    );
}

/// An optional artifact was missing or invalid and the command carried on.
pub fn emit_artifact_degraded(artifact: &str, reason: &dyn std::fmt::Display) {
    warn!(event = "artifact.degraded", artifact = %artifact, reason = %reason);
}

pub fn emit_incident_published(failure_class: &str, output_file: &str) {
    info!(
        event = "incident.published",
        failure_class = %failure_class,
        output_file = %output_file,
    );
}
