//! Selective decisions collector.

use std::io::Write;

use qgate_domain::{OutputMode, SelectiveDecision, SelectiveDecisionsAggregate};

use crate::context::{EnvSnapshot, RunContext};
use crate::error::Result;
use crate::io::{self, JsonRead};
use crate::obs;
use crate::validators::selective_decision;

/// Checks whose decisions are collected, in output order.
pub const SELECTIVE_SOURCES: [&str; 3] = ["lint-scope", "smoke-scope", "contracts-scope"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOptions {
    /// Directory holding `selective-decision-<check>.json` files.
    pub dir: String,
    pub output_file: String,
    pub mode: OutputMode,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            dir: "test-results".to_string(),
            output_file: "test-results/selective-decisions.json".to_string(),
            mode: OutputMode::Text,
        }
    }
}

pub fn source_file(dir: &str, check: &str) -> String {
    format!("{}/selective-decision-{}.json", dir.trim_end_matches('/'), check)
}

/// One source as a decision, or the warning explaining why it was dropped.
fn load_source(
    env: &EnvSnapshot,
    dir: &str,
    check: &str,
) -> std::result::Result<SelectiveDecision, String> {
    let file = source_file(dir, check);
    let value = match io::read_json_lenient(&env.resolve(&file)) {
        JsonRead::Missing => return Err(format!("{}: file not found ({})", check, file)),
        JsonRead::Unparseable(reason) => {
            return Err(format!("{}: invalid JSON in {} ({})", check, file, reason))
        }
        JsonRead::Parsed(value) => value,
    };

    let errors = selective_decision::validate_value(&value, "");
    if !errors.is_empty() {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(format!(
            "{}: invalid decision in {} ({})",
            check,
            file,
            messages.join("; ")
        ));
    }
    let decision: SelectiveDecision = serde_json::from_value(value)
        .map_err(|e| format!("{}: invalid decision in {} ({})", check, file, e))?;
    if decision.check != check {
        return Err(format!(
            "{}: decision in {} is for check \"{}\"",
            check, file, decision.check
        ));
    }
    Ok(decision)
}

/// Build the aggregate from whatever sources are usable.
pub fn collect_decisions(env: &EnvSnapshot, dir: &str) -> SelectiveDecisionsAggregate {
    let mut decisions = Vec::new();
    let mut warnings = Vec::new();
    for check in SELECTIVE_SOURCES {
        match load_source(env, dir, check) {
            Ok(decision) => decisions.push(decision),
            Err(warning) => {
                obs::emit_artifact_degraded("selective-decision", &warning);
                warnings.push(warning);
            }
        }
    }
    obs::emit_aggregate_built("selective-decisions", decisions.len(), warnings.len());
    SelectiveDecisionsAggregate::new(decisions, warnings)
}

fn render_text(aggregate: &SelectiveDecisionsAggregate, output_file: &str) -> String {
    let mut text = format!(
        "Selective decisions: {} collected, {} warning(s) -> {}\n",
        aggregate.decisions.len(),
        aggregate.warnings.len(),
        output_file
    );
    for decision in &aggregate.decisions {
        text.push_str(&format!(
            "- {}: {} ({})\n",
            decision.check,
            decision.decision.as_str(),
            decision.reason
        ));
    }
    for warning in &aggregate.warnings {
        text.push_str(&format!("- Warning: {}\n", warning));
    }
    text
}

/// Collect, write the aggregate, and report. Always exits 0.
pub fn collect_selective_decisions<W: Write>(
    ctx: &mut RunContext<W>,
    options: &CollectOptions,
) -> Result<i32> {
    let aggregate = collect_decisions(&ctx.env, &options.dir);
    io::write_json_pretty(&ctx.env.resolve(&options.output_file), &aggregate)?;

    match options.mode {
        OutputMode::Json => {
            let json = serde_json::to_string_pretty(&aggregate)?;
            ctx.print(&format!("{}\n", json))?;
        }
        OutputMode::Text => {
            let text = render_text(&aggregate, &options.output_file);
            ctx.print(&text)?;
        }
    }
    Ok(0)
}
