//! Human-readable quality gate report.

use qgate_domain::{recommendation_quick_map, FailureClass};

use super::{ArtifactSignal, GateEvaluation, GateInputs};

fn verdict(ok: bool) -> &'static str {
    if ok {
        "PASS"
    } else {
        "FAIL"
    }
}

fn signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

/// Bullet list capped at `max_items`, with a trailing "... and N more".
fn push_capped<S: AsRef<str>>(
    out: &mut String,
    items: &[S],
    max_items: usize,
    fmt: fn(&str) -> String,
) {
    for item in items.iter().take(max_items) {
        out.push_str(&format!("- {}\n", fmt(item.as_ref())));
    }
    if items.len() > max_items {
        out.push_str(&format!("- ... and {} more\n", items.len() - max_items));
    }
}

fn plain(item: &str) -> String {
    item.to_string()
}

fn code(item: &str) -> String {
    format!("`{}`", item)
}

fn warning(item: &str) -> String {
    format!("Warning: {}", item)
}

fn signal_status(signal: &ArtifactSignal) -> &'static str {
    match (signal.issue, signal.ok) {
        (false, _) => "PASS",
        (true, Some(false)) => "FAIL",
        (true, _) => "UNAVAILABLE",
    }
}

fn push_signal_section(
    out: &mut String,
    heading: &str,
    signal: &ArtifactSignal,
    max_items: usize,
) {
    if !signal.configured {
        return;
    }
    out.push_str(&format!("\n### {}\n", heading));
    out.push_str(&format!("- Status: {}\n", signal_status(signal)));
    push_capped(out, &signal.warnings, max_items, warning);
}

fn push_smoke_suite(
    out: &mut String,
    inputs: &GateInputs,
    eval: &GateEvaluation,
    max_items: usize,
) {
    out.push_str("\n### Smoke Suite\n");
    if inputs.smoke_suite_files.is_empty() {
        out.push_str("- Suite files: unavailable\n");
    } else {
        out.push_str(&format!("- Suite files: {}\n", inputs.smoke_suite_files.len()));
        push_capped(out, &inputs.smoke_suite_files, max_items, code);
    }
    match &eval.drift {
        None => out.push_str("- Baseline: not provided\n"),
        Some(drift) if !drift.changed => {
            out.push_str(&format!(
                "- Baseline: {} files, no drift\n",
                drift.baseline_files.len()
            ));
        }
        Some(drift) => {
            out.push_str(&format!(
                "- Baseline: {} files, {} added, {} removed\n",
                drift.baseline_files.len(),
                drift.added_files.len(),
                drift.removed_files.len()
            ));
            push_capped(out, &drift.added_files, max_items, |f| format!("Added: `{}`", f));
            push_capped(out, &drift.removed_files, max_items, |f| format!("Removed: `{}`", f));
            out.push_str(&format!(
                "- Recommended baseline: `{}`\n",
                drift.recommended_baseline
            ));
        }
    }
}

fn push_selective(out: &mut String, inputs: &GateInputs, max_items: usize) {
    if !inputs.selective.configured {
        return;
    }
    out.push_str("\n### Selective Checks\n");
    if inputs.selective.issue {
        out.push_str("- Aggregate: UNAVAILABLE\n");
    }
    for decision in &inputs.selective_decisions {
        out.push_str(&format!(
            "- {}: {} ({})\n",
            decision.check,
            decision.decision.as_str(),
            decision.reason
        ));
    }
    push_capped(out, &inputs.selective.warnings, max_items, warning);
}

fn push_actions(out: &mut String, eval: &GateEvaluation, class: FailureClass) {
    out.push_str("\n### Action Required\n");
    if !eval.inconsistencies.is_empty() {
        out.push_str("- Inspect upstream job logs for infra/step failures and verify artifact publication matches job outcome.\n");
    }
    if !eval.lint_present {
        out.push_str("- Re-run lint job and verify `eslint-results` artifact upload.\n");
    } else if !eval.lint_ok {
        out.push_str("- Fix lint violations and re-run `yarn lint:ci`.\n");
    }
    if !eval.smoke_present {
        out.push_str("- Re-run smoke job and verify `jest-smoke-results` artifact upload.\n");
    } else if !eval.smoke_ok {
        out.push_str("- Investigate failing smoke tests and re-run `yarn test:smoke:critical`.\n");
    }
    if eval.budget_blocking {
        out.push_str("- Reduce smoke runtime or raise budget threshold if justified for the current suite size.\n");
    }
    if eval.signals.selective_issue {
        out.push_str("- Regenerate the selective decisions aggregate with `qgate collect-selective-decisions` and check it with `qgate validate selective-decisions`.\n");
    }
    if eval.signals.validator_issue {
        out.push_str("- Fix the failing validator contracts listed in `validator-contracts-summary.json`.\n");
    }
    if eval.signals.runtime_issue {
        out.push_str("- Fix the errors reported by the runtime config diagnostics.\n");
    }

    out.push_str("\n### How to Reproduce Locally\n");
    let mut has_repro = false;
    if !eval.lint_ok {
        has_repro = true;
        out.push_str("- `yarn lint:ci`\n");
    }
    if !eval.smoke_ok {
        has_repro = true;
        out.push_str("- `yarn test:smoke:critical:ci`\n");
    }
    if !has_repro {
        let command = match class {
            FailureClass::InconsistentState => {
                "- `yarn lint:ci`\n- `yarn test:smoke:critical:ci`\n- Re-check CI artifact upload/download steps for both jobs.\n"
            }
            FailureClass::PerformanceBudget => {
                "- `SMOKE_DURATION_BUDGET_SECONDS=10 SMOKE_DURATION_BUDGET_STRICT=true qgate summarize-quality-gate test-results/eslint-results.json test-results/jest-smoke-results.json --fail-on-missing`\n"
            }
            FailureClass::SelectiveContract => "- `qgate validate selective-decisions`\n",
            FailureClass::ValidatorContract => {
                "- `qgate summarize-validator-contracts`\n- `qgate validate validator-contracts-summary`\n"
            }
            FailureClass::ConfigContract => {
                "- `qgate summarize-quality-gate --runtime-config-file test-results/runtime-config-diagnostics.json`\n"
            }
            _ => "",
        };
        out.push_str(command);
    }
}

/// Render the multi-section report.
///
/// Lists longer than `max_items` are truncated with a count of the rest.
pub fn render_report(inputs: &GateInputs, eval: &GateEvaluation, max_items: usize) -> String {
    let mut out = String::from("## Quality Gate Summary\n\n");
    out.push_str(&format!("- Overall Quality Gate: {}\n", verdict(eval.overall_ok)));
    if let Some(class) = eval.failure_class {
        let id = class.recommendation_id();
        out.push_str(&format!("- Failure Class: {}\n", class));
        out.push_str(&format!("- Recommendation ID: {}\n", id));
        out.push_str(&format!("- See: {} ({})\n", class.docs_anchor(), id));
        out.push_str(&format!("- QG quick map: {}\n", recommendation_quick_map()));
    }
    let missing = |present: bool| if present { "" } else { " (report missing)" };
    out.push_str(&format!(
        "- Lint: {}{}\n",
        verdict(eval.lint_ok),
        missing(eval.lint_present)
    ));
    out.push_str(&format!(
        "- Smoke tests: {}{}\n",
        verdict(eval.smoke_ok),
        missing(eval.smoke_present)
    ));
    out.push_str(&format!(
        "- Upstream job results: lint={}, smoke={}\n",
        inputs.lint_job, inputs.smoke_job
    ));

    out.push_str("\n### Details\n");
    out.push_str(&format!("- Lint files checked: {}\n", eval.lint.files));
    out.push_str(&format!("- Lint errors: {}\n", eval.lint.errors));
    out.push_str(&format!("- Lint warnings: {}\n", eval.lint.warnings));
    out.push_str(&format!(
        "- Smoke suites: {} total, {} failed\n",
        eval.smoke.suites, eval.smoke.failed_suites
    ));
    out.push_str(&format!(
        "- Smoke tests: {} total, {} failed\n",
        eval.smoke.tests, eval.smoke.failed_tests
    ));
    if let Some(budget) = inputs.budget_seconds {
        out.push_str(&format!(
            "- Smoke duration: {}s (budget: {}s){}\n",
            eval.smoke_duration_seconds,
            budget,
            if eval.over_budget { " [OVER BUDGET]" } else { "" }
        ));
    }
    if let Some(trend) = eval.trend {
        out.push_str(&format!(
            "- Smoke trend: {}s ({}%) vs previous {}s [{}]\n",
            signed(trend.delta_seconds),
            signed(trend.delta_percent),
            trend.previous_seconds,
            trend.direction()
        ));
    }

    push_smoke_suite(&mut out, inputs, eval, max_items);
    push_selective(&mut out, inputs, max_items);
    push_signal_section(
        &mut out,
        "Validator Contracts",
        &inputs.validator_contracts,
        max_items,
    );
    push_signal_section(&mut out, "Runtime Config", &inputs.runtime_config, max_items);

    if !eval.inconsistencies.is_empty() {
        out.push_str("\n### Consistency Checks\n");
        push_capped(&mut out, &eval.inconsistencies, usize::MAX, plain);
    }

    if eval.over_budget {
        if let Some(budget) = inputs.budget_seconds {
            out.push_str("\n### Performance Budget\n");
            out.push_str(&format!(
                "- Smoke duration exceeded budget ({}s > {}s).\n",
                eval.smoke_duration_seconds, budget
            ));
            out.push_str(if inputs.budget_strict {
                "- Strict budget mode is enabled: this is treated as a blocking quality gate failure.\n"
            } else {
                "- Consider trimming test scope or parallelizing CI jobs.\n"
            });
        }
    }

    if let Some(class) = eval.failure_class {
        push_actions(&mut out, eval, class);
    }
    out
}
