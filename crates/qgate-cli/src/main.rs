//! qgate - CI quality gate and contract validation
//!
//! The `qgate` command validates the artifacts CI stages exchange, builds the
//! aggregate summaries, and decides the overall quality gate.
//!
//! ## Commands
//!
//! - `validate <kind>`: validate one artifact against its contract
//! - `collect-selective-decisions`: aggregate per-check selective decisions
//! - `summarize-validator-contracts`: roll validator outputs into one summary
//! - `summarize-quality-gate`: evaluate the gate and render the report
//! - `publish-ci-incident-snippet`: publish the incident snippet and payload
//! - `render-error-codes-table`: print the expected error-codes docs block

use std::io::Write;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, Level};

use qgate_core::incident::ArtifactRef;
use qgate_core::obs::CommandSpan;
use qgate_core::quality_gate::run::{DEFAULT_LINT_REPORT, DEFAULT_MAX_ITEMS, DEFAULT_TEST_REPORT};
use qgate_core::{
    collect_selective_decisions, publish, run_validator, summarize_quality_gate,
    summarize_validator_contracts, validator_for, ArtifactKind, CollectOptions, EnvSnapshot,
    GateOptions, PublishOptions, RunContext, SummarizeOptions, ValidateOptions,
};
use qgate_domain::{error_codes, OutputMode};

#[derive(Parser)]
#[command(name = "qgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CI quality gate and contract validation", long_about = None)]
struct Cli {
    /// Enable verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "QGATE_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one artifact against its contract
    Validate {
        /// Artifact kind
        #[arg(value_parser = parse_kind)]
        kind: ArtifactKind,

        /// Artifact file (default depends on the kind)
        #[arg(long, alias = "schema-file")]
        file: Option<String>,

        /// Also write the validator output JSON here
        #[arg(long)]
        json_output: Option<String>,

        /// Print the validator output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Aggregate per-check selective decisions into one file
    CollectSelectiveDecisions {
        /// Directory holding selective-decision-<check>.json files
        #[arg(long, default_value = "test-results")]
        dir: String,

        /// Aggregate output path
        #[arg(long, default_value = "test-results/selective-decisions.json")]
        output_file: String,

        /// Print the aggregate as JSON
        #[arg(long)]
        json: bool,
    },

    /// Roll the per-validator outputs into the contracts summary
    SummarizeValidatorContracts {
        /// Directory holding <check>-validation.json files
        #[arg(long, default_value = "test-results")]
        dir: String,

        /// Summary output path
        #[arg(long, default_value = "test-results/validator-contracts-summary.json")]
        output_file: String,

        /// Also render the PR guard comment here
        #[arg(long)]
        comment_file: Option<String>,

        /// Exit non-zero when a validation output is missing or unreadable
        #[arg(long)]
        fail_on_missing: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate the quality gate and render its report
    SummarizeQualityGate(GateArgs),

    /// Publish the CI incident snippet for a failed run
    PublishCiIncidentSnippet(PublishArgs),

    /// Print the expected error-codes docs table block
    RenderErrorCodesTable,
}

#[derive(Args)]
struct GateArgs {
    /// Lint report (JSON array of per-file results)
    #[arg(default_value = DEFAULT_LINT_REPORT)]
    lint_report: String,

    /// Smoke test report (JSON object)
    #[arg(default_value = DEFAULT_TEST_REPORT)]
    test_report: String,

    /// Selective decisions aggregate
    #[arg(long)]
    selective_decisions_file: Option<String>,

    /// Validator output of the validator-contracts-summary validation
    #[arg(
        long,
        visible_alias = "validator-contracts-file",
        alias = "validator-contracts-summary-validation-file"
    )]
    validator_file: Option<String>,

    /// Runtime config diagnostics
    #[arg(long, alias = "runtime-config-diagnostics-file")]
    runtime_config_file: Option<String>,

    /// Write the quality snapshot here
    #[arg(long)]
    json_output: Option<String>,

    /// Write the smoke-suite baseline recommendation here
    #[arg(long)]
    baseline_recommendation_output: Option<String>,

    /// Maximum list items per report section
    #[arg(long, default_value_t = DEFAULT_MAX_ITEMS)]
    max_items: usize,

    /// Fail on missing reports and inconsistent job results
    #[arg(long)]
    fail_on_missing: bool,

    /// Print the snapshot as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PublishArgs {
    /// Quality snapshot written by summarize-quality-gate
    #[arg(long, default_value = "test-results/quality-summary.json")]
    summary_file: String,

    /// Snippet output path
    #[arg(long, default_value = "test-results/ci-incident-snippet.md")]
    output_file: String,

    /// Workflow run URL
    #[arg(long, default_value = "")]
    workflow_run: String,

    /// Branch or pull request reference
    #[arg(long, default_value = "")]
    branch_pr: String,

    #[arg(long, default_value = "")]
    impact: String,

    #[arg(long, default_value = "")]
    owner: String,

    #[arg(long, default_value = "")]
    eta: String,

    #[arg(long, default_value = "Initial triage started")]
    immediate_action: String,

    #[arg(long, default_value = "yes")]
    follow_up: String,

    /// Selective decisions artifact URL
    #[arg(long, default_value = "")]
    artifact_url: String,

    /// Selective decisions artifact id
    #[arg(long, default_value = "")]
    artifact_id: String,

    #[arg(long, default_value = "")]
    validator_artifact_url: String,

    #[arg(long, default_value = "")]
    validator_artifact_id: String,

    #[arg(long, default_value = "")]
    runtime_artifact_url: String,

    #[arg(long, default_value = "")]
    runtime_artifact_id: String,

    /// Print the incident payload as JSON
    #[arg(long)]
    json: bool,
}

fn parse_kind(s: &str) -> std::result::Result<ArtifactKind, String> {
    s.parse::<ArtifactKind>().map_err(|_| {
        format!(
            "unknown artifact kind '{}' (expected one of: {})",
            s,
            ArtifactKind::names().join(", ")
        )
    })
}

fn output_mode(json: bool) -> OutputMode {
    if json {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Validate { .. } => "validate",
            Commands::CollectSelectiveDecisions { .. } => "collect-selective-decisions",
            Commands::SummarizeValidatorContracts { .. } => "summarize-validator-contracts",
            Commands::SummarizeQualityGate(_) => "summarize-quality-gate",
            Commands::PublishCiIncidentSnippet(_) => "publish-ci-incident-snippet",
            Commands::RenderErrorCodesTable => "render-error-codes-table",
        }
    }

    /// Prefix of the fatal error line on stderr.
    fn failure_prefix(&self) -> String {
        match self {
            Commands::Validate { kind, .. } => validator_for(*kind).failure_prefix(),
            Commands::CollectSelectiveDecisions { .. } => "Selective decisions collection".into(),
            Commands::SummarizeValidatorContracts { .. } => {
                "Validator contracts summary".into()
            }
            Commands::SummarizeQualityGate(_) => "Quality summary".into(),
            Commands::PublishCiIncidentSnippet(_) => "CI incident snippet".into(),
            Commands::RenderErrorCodesTable => "Error codes table".into(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    qgate_core::init_tracing(cli.log_json, level);

    let prefix = cli.command.failure_prefix();
    let code = match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}: failed: {:#}", prefix, err);
            1
        }
    };
    std::process::exit(code);
}

fn run(command: Commands) -> Result<i32> {
    let _span = CommandSpan::enter(command.name());
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let env = EnvSnapshot::new(std::env::vars(), cwd);
    debug!(command = command.name(), "starting");

    let stdout = std::io::stdout();
    let mut ctx = RunContext::new(env, stdout.lock());

    let code = match command {
        Commands::Validate {
            kind,
            file,
            json_output,
            json,
        } => {
            let options = ValidateOptions {
                file,
                mode: output_mode(json),
                json_output,
            };
            run_validator(validator_for(kind), &mut ctx, &options)
                .with_context(|| format!("{} validation did not complete", kind))?
        }
        Commands::CollectSelectiveDecisions {
            dir,
            output_file,
            json,
        } => {
            let options = CollectOptions {
                dir,
                output_file,
                mode: output_mode(json),
            };
            collect_selective_decisions(&mut ctx, &options)
                .context("Failed to collect selective decisions")?
        }
        Commands::SummarizeValidatorContracts {
            dir,
            output_file,
            comment_file,
            fail_on_missing,
            json,
        } => {
            let options = SummarizeOptions {
                dir,
                output_file,
                comment_file,
                fail_on_missing,
                mode: output_mode(json),
            };
            summarize_validator_contracts(&mut ctx, &options)
                .context("Failed to summarize validator contracts")?
        }
        Commands::SummarizeQualityGate(args) => cmd_summarize_quality_gate(&mut ctx, args)?,
        Commands::PublishCiIncidentSnippet(args) => cmd_publish(&mut ctx, args)?,
        Commands::RenderErrorCodesTable => {
            ctx.print(&error_codes::render_docs_block(&error_codes::REGISTRY))?;
            0
        }
    };

    ctx.out.flush().context("Failed to flush stdout")?;
    Ok(code)
}

fn cmd_summarize_quality_gate<W: Write>(ctx: &mut RunContext<W>, args: GateArgs) -> Result<i32> {
    let options = GateOptions {
        lint_report: args.lint_report,
        test_report: args.test_report,
        selective_decisions_file: args.selective_decisions_file,
        validator_file: args.validator_file,
        runtime_config_file: args.runtime_config_file,
        json_output: args.json_output,
        baseline_recommendation_output: args.baseline_recommendation_output,
        max_items: args.max_items,
        fail_on_missing: args.fail_on_missing,
        mode: output_mode(args.json),
    };
    summarize_quality_gate(ctx, &options).context("Failed to evaluate the quality gate")
}

fn cmd_publish<W: Write>(ctx: &mut RunContext<W>, args: PublishArgs) -> Result<i32> {
    let options = PublishOptions {
        summary_file: args.summary_file,
        output_file: args.output_file,
        mode: output_mode(args.json),
        workflow_run: args.workflow_run,
        branch_pr: args.branch_pr,
        impact: args.impact,
        owner: args.owner,
        eta: args.eta,
        immediate_action: args.immediate_action,
        follow_up: args.follow_up,
        selective_artifact: ArtifactRef {
            url: args.artifact_url,
            id: args.artifact_id,
        },
        validator_artifact: ArtifactRef {
            url: args.validator_artifact_url,
            id: args.validator_artifact_id,
        },
        runtime_artifact: ArtifactRef {
            url: args.runtime_artifact_url,
            id: args.runtime_artifact_id,
        },
    };
    publish(ctx, &options, chrono::Utc::now()).context("Failed to publish the incident snippet")?;
    Ok(0)
}
