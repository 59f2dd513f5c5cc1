//! CI incident snippet publisher.
//!
//! Turns the quality snapshot into a markdown incident snippet plus its
//! machine-readable [`CiIncidentPayload`]. The artifact triple table and the
//! snippet layout live here so the payload and snippet validators check
//! exactly what the publisher writes.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;

use qgate_domain::schema::CI_INCIDENT_PAYLOAD_SCHEMA_VERSION;
use qgate_domain::{ArtifactSource, CiIncidentPayload, FailureClass, JobResult, OutputMode};

use crate::context::RunContext;
use crate::error::{QgateError, Result};
use crate::markdown::labelled_values;
use crate::{io, obs};

/// First non-empty line of every snippet.
pub const INCIDENT_HEADING: &str = "### CI Smoke Incident";

pub const DETECTED_LABEL: &str = "Detected (UTC)";
pub const FAILURE_CLASS_LABEL: &str = "Failure Class";
pub const RECOMMENDATION_LABEL: &str = "Recommendation ID";

/// Labelled lines every snippet carries exactly once, in render order.
pub const SNIPPET_FIELDS: [&str; 10] = [
    DETECTED_LABEL,
    "Workflow run",
    "Branch/PR",
    FAILURE_CLASS_LABEL,
    RECOMMENDATION_LABEL,
    "Impact",
    "Owner",
    "ETA",
    "Immediate action",
    "Follow-up",
];

/// A workflow run URL that artifact ids can be appended to.
pub const RUN_URL_PATTERN: &str = r"^https://github\.com/.+/actions/runs/\d+$";
/// An artifact URL derived from a run URL and an artifact id.
pub const RUN_ARTIFACT_URL_PATTERN: &str = r"^https://github\.com/.+/actions/runs/\d+/artifacts/\d+$";

const PLACEHOLDER: &str = "<fill>";

// ----------------------------------------------------------------------------
// Artifact triples
// ----------------------------------------------------------------------------

/// One `(source, url)` pair of the incident payload and the failure class
/// that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactTriple {
    Selective,
    Validator,
    Runtime,
}

impl ArtifactTriple {
    pub const ALL: [ArtifactTriple; 3] = [
        ArtifactTriple::Selective,
        ArtifactTriple::Validator,
        ArtifactTriple::Runtime,
    ];

    pub fn source_field(self) -> &'static str {
        match self {
            ArtifactTriple::Selective => "artifactSource",
            ArtifactTriple::Validator => "validatorArtifactSource",
            ArtifactTriple::Runtime => "runtimeArtifactSource",
        }
    }

    pub fn url_field(self) -> &'static str {
        match self {
            ArtifactTriple::Selective => "artifactUrl",
            ArtifactTriple::Validator => "validatorArtifactUrl",
            ArtifactTriple::Runtime => "runtimeArtifactUrl",
        }
    }

    /// The only class allowed to use the `fallback` source.
    pub fn owner_class(self) -> FailureClass {
        match self {
            ArtifactTriple::Selective => FailureClass::SelectiveContract,
            ArtifactTriple::Validator => FailureClass::ValidatorContract,
            ArtifactTriple::Runtime => FailureClass::ConfigContract,
        }
    }

    /// Label of the `- <label>: <url>` snippet line.
    pub fn markdown_label(self) -> &'static str {
        match self {
            ArtifactTriple::Selective => "Selective decisions artifact",
            ArtifactTriple::Validator => "Validator contracts artifact",
            ArtifactTriple::Runtime => "Runtime config diagnostics artifact",
        }
    }

    /// Artifact name used in follow-up text.
    pub fn artifact_name(self) -> &'static str {
        match self {
            ArtifactTriple::Selective => "selective-decisions",
            ArtifactTriple::Validator => "validator-contracts-summary-validation",
            ArtifactTriple::Runtime => "runtime-config-diagnostics",
        }
    }

    /// Local path referenced when no URL is available.
    pub fn default_path(self) -> &'static str {
        match self {
            ArtifactTriple::Selective => "test-results/selective-decisions.json",
            ArtifactTriple::Validator => "test-results/validator-contracts-summary-validation.json",
            ArtifactTriple::Runtime => "test-results/runtime-config-diagnostics.json",
        }
    }

    /// Whether this triple may be populated for `class`.
    ///
    /// The runtime triple is reported only for config contract failures.
    pub fn applies_to(self, class: FailureClass) -> bool {
        self != ArtifactTriple::Runtime || class == FailureClass::ConfigContract
    }
}

// ----------------------------------------------------------------------------
// Resolution
// ----------------------------------------------------------------------------

/// Class used when the snapshot carries none.
pub fn fallback_failure_class(lint: JobResult, smoke: JobResult) -> FailureClass {
    match (lint == JobResult::Success, smoke == JobResult::Success) {
        (false, true) => FailureClass::LintOnly,
        (true, false) => FailureClass::SmokeOnly,
        _ => FailureClass::Mixed,
    }
}

/// Snapshot class first; absent or unrecognised falls back to job results.
pub fn resolve_failure_class(
    snapshot: Option<&Value>,
    lint: JobResult,
    smoke: JobResult,
) -> FailureClass {
    snapshot
        .and_then(|s| s.get("failureClass"))
        .and_then(Value::as_str)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or_else(|| fallback_failure_class(lint, smoke))
}

/// Snapshot recommendation id first, else the class's mapped id.
pub fn resolve_recommendation_id(snapshot: Option<&Value>, class: FailureClass) -> String {
    snapshot
        .and_then(|s| s.get("recommendationId"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| class.recommendation_id().to_string())
}

/// Caller-supplied artifact reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactRef {
    pub url: String,
    pub id: String,
}

/// Compiled URL patterns shared by resolution and validation.
pub struct UrlPatterns {
    run: Regex,
    run_artifact: Regex,
    artifact_id: Regex,
}

impl UrlPatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            run: Regex::new(RUN_URL_PATTERN)?,
            run_artifact: Regex::new(RUN_ARTIFACT_URL_PATTERN)?,
            artifact_id: Regex::new(r"^\d+$")?,
        })
    }

    pub fn is_run_artifact_url(&self, url: &str) -> bool {
        self.run_artifact.is_match(url)
    }

    fn derived_url(&self, workflow_run: &str, artifact: &ArtifactRef) -> Option<String> {
        let run = workflow_run.trim();
        let id = artifact.id.trim();
        (self.run.is_match(run) && self.artifact_id.is_match(id))
            .then(|| format!("{}/artifacts/{}", run, id))
    }

    /// Explicit URL, else `<run>/artifacts/<id>` when both look valid.
    pub fn resolve_url(&self, workflow_run: &str, artifact: &ArtifactRef) -> String {
        let explicit = artifact.url.trim();
        if !explicit.is_empty() {
            return explicit.to_string();
        }
        self.derived_url(workflow_run, artifact).unwrap_or_default()
    }

    pub fn resolve_source(
        &self,
        triple: ArtifactTriple,
        class: FailureClass,
        workflow_run: &str,
        artifact: &ArtifactRef,
    ) -> ArtifactSource {
        if !artifact.url.trim().is_empty() {
            ArtifactSource::Explicit
        } else if self.derived_url(workflow_run, artifact).is_some() {
            ArtifactSource::RunId
        } else if class == triple.owner_class() {
            ArtifactSource::Fallback
        } else {
            ArtifactSource::NotAvailable
        }
    }
}

/// Point the follow-up at the owning artifact unless it already does.
pub fn normalize_follow_up(
    triple: ArtifactTriple,
    class: FailureClass,
    follow_up: &str,
    artifact_url: &str,
) -> String {
    let base = match follow_up.trim() {
        "" => "yes",
        text => text,
    };
    if class != triple.owner_class() {
        return base.to_string();
    }
    let lowered = base.to_ascii_lowercase();
    if lowered.contains(triple.artifact_name())
        || lowered.contains(&triple.markdown_label().to_ascii_lowercase())
    {
        return base.to_string();
    }
    let reference = match artifact_url.trim() {
        "" => triple.default_path(),
        url => url,
    };
    format!(
        "{}; inspect {} artifact ({})",
        base,
        triple.artifact_name(),
        reference
    )
}

// ----------------------------------------------------------------------------
// Rendering
// ----------------------------------------------------------------------------

/// Field values of one snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetFields {
    pub detected_at: String,
    pub workflow_run: String,
    pub branch_pr: String,
    pub failure_class: FailureClass,
    pub recommendation_id: String,
    pub impact: String,
    pub owner: String,
    pub eta: String,
    pub immediate_action: String,
    pub follow_up: String,
    /// `(triple, url)`; empty URLs are not rendered.
    pub artifacts: Vec<(ArtifactTriple, String)>,
}

fn or_placeholder(value: &str) -> &str {
    match value.trim() {
        "" => PLACEHOLDER,
        v => v,
    }
}

pub fn render_snippet(fields: &SnippetFields) -> String {
    let values = [
        fields.detected_at.as_str(),
        or_placeholder(&fields.workflow_run),
        or_placeholder(&fields.branch_pr),
        fields.failure_class.as_str(),
        fields.recommendation_id.as_str(),
        or_placeholder(&fields.impact),
        or_placeholder(&fields.owner),
        or_placeholder(&fields.eta),
        or_placeholder(&fields.immediate_action),
        or_placeholder(&fields.follow_up),
    ];

    let mut md = String::new();
    md.push_str(INCIDENT_HEADING);
    md.push_str("\n\n");
    for (label, value) in SNIPPET_FIELDS.iter().zip(values) {
        md.push_str(&format!("- {}: {}\n", label, value));
    }
    for (triple, url) in &fields.artifacts {
        if !url.trim().is_empty() {
            md.push_str(&format!("- {}: {}\n", triple.markdown_label(), url.trim()));
        }
    }
    md
}

// ----------------------------------------------------------------------------
// Publishing
// ----------------------------------------------------------------------------

pub const DEFAULT_SUMMARY_FILE: &str = "test-results/quality-summary.json";
pub const DEFAULT_OUTPUT_FILE: &str = "test-results/ci-incident-snippet.md";

/// Env var carrying the lint job result for the fallback class.
pub const LINT_RESULT_VAR: &str = "LINT_RESULT";
/// Env var carrying the smoke job result for the fallback class.
pub const SMOKE_RESULT_VAR: &str = "SMOKE_RESULT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    pub summary_file: String,
    pub output_file: String,
    pub mode: OutputMode,
    pub workflow_run: String,
    pub branch_pr: String,
    pub impact: String,
    pub owner: String,
    pub eta: String,
    pub immediate_action: String,
    pub follow_up: String,
    pub selective_artifact: ArtifactRef,
    pub validator_artifact: ArtifactRef,
    pub runtime_artifact: ArtifactRef,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            summary_file: DEFAULT_SUMMARY_FILE.to_string(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            mode: OutputMode::Text,
            workflow_run: String::new(),
            branch_pr: String::new(),
            impact: PLACEHOLDER.to_string(),
            owner: PLACEHOLDER.to_string(),
            eta: PLACEHOLDER.to_string(),
            immediate_action: "Initial triage started".to_string(),
            follow_up: "yes".to_string(),
            selective_artifact: ArtifactRef::default(),
            validator_artifact: ArtifactRef::default(),
            runtime_artifact: ArtifactRef::default(),
        }
    }
}

impl PublishOptions {
    fn artifact(&self, triple: ArtifactTriple) -> &ArtifactRef {
        match triple {
            ArtifactTriple::Selective => &self.selective_artifact,
            ArtifactTriple::Validator => &self.validator_artifact,
            ArtifactTriple::Runtime => &self.runtime_artifact,
        }
    }
}

/// Read the snapshot: missing is `None`, unparseable is fatal.
fn read_snapshot(path: &std::path::Path) -> Result<Option<Value>> {
    match io::read_json_lenient(path) {
        io::JsonRead::Missing => Ok(None),
        io::JsonRead::Parsed(value) => Ok(Some(value)),
        io::JsonRead::Unparseable(reason) => Err(QgateError::InvalidInput(format!(
            "cannot parse quality summary {}: {}",
            path.display(),
            reason
        ))),
    }
}

/// Build the payload without touching the filesystem beyond the snapshot.
pub fn build_payload(
    snapshot: Option<&Value>,
    lint: JobResult,
    smoke: JobResult,
    options: &PublishOptions,
    output_file: &str,
    detected_at: DateTime<Utc>,
) -> Result<CiIncidentPayload> {
    let patterns = UrlPatterns::new()?;
    let class = resolve_failure_class(snapshot, lint, smoke);
    let recommendation_id = resolve_recommendation_id(snapshot, class);

    let mut urls = Vec::new();
    let mut sources = Vec::new();
    let mut follow_up = options.follow_up.clone();
    for triple in ArtifactTriple::ALL {
        let artifact = options.artifact(triple);
        let (url, source) = if triple.applies_to(class) {
            (
                patterns.resolve_url(&options.workflow_run, artifact),
                patterns.resolve_source(triple, class, &options.workflow_run, artifact),
            )
        } else {
            (String::new(), ArtifactSource::NotAvailable)
        };
        follow_up = normalize_follow_up(triple, class, &follow_up, &url);
        urls.push(url);
        sources.push(source);
    }

    let markdown = render_snippet(&SnippetFields {
        detected_at: detected_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        workflow_run: options.workflow_run.clone(),
        branch_pr: options.branch_pr.clone(),
        failure_class: class,
        recommendation_id: recommendation_id.clone(),
        impact: options.impact.clone(),
        owner: options.owner.clone(),
        eta: options.eta.clone(),
        immediate_action: options.immediate_action.clone(),
        follow_up,
        artifacts: ArtifactTriple::ALL
            .iter()
            .copied()
            .zip(urls.iter().cloned())
            .collect(),
    });

    Ok(CiIncidentPayload {
        schema_version: CI_INCIDENT_PAYLOAD_SCHEMA_VERSION,
        failure_class: class,
        recommendation_id,
        workflow_run: options.workflow_run.clone(),
        branch_pr: options.branch_pr.clone(),
        output_file: output_file.to_string(),
        markdown,
        artifact_url: urls[0].clone(),
        artifact_source: sources[0],
        validator_artifact_url: urls[1].clone(),
        validator_artifact_source: sources[1],
        runtime_artifact_url: urls[2].clone(),
        runtime_artifact_source: sources[2],
        primary_artifact_kind: class.primary_artifact_kind(),
    })
}

/// Publish the snippet: write it, mirror it into the step summary, and print
/// the payload in JSON mode.
pub fn publish<W: Write>(
    ctx: &mut RunContext<W>,
    options: &PublishOptions,
    detected_at: DateTime<Utc>,
) -> Result<CiIncidentPayload> {
    let snapshot = read_snapshot(&ctx.env.resolve(&options.summary_file))?;
    if snapshot.is_none() {
        obs::emit_artifact_degraded("quality-summary", &"snapshot not found, using job results");
    }
    let lint = JobResult::parse_lenient(ctx.env.var(LINT_RESULT_VAR).unwrap_or(""));
    let smoke = JobResult::parse_lenient(ctx.env.var(SMOKE_RESULT_VAR).unwrap_or(""));

    let output_path = ctx.env.resolve(&options.output_file);
    let output_display = output_path.to_string_lossy().to_string();
    let payload = build_payload(
        snapshot.as_ref(),
        lint,
        smoke,
        options,
        &output_display,
        detected_at,
    )?;

    io::write_text(&output_path, &payload.markdown)?;
    ctx.append_step_summary(&payload.markdown)?;
    if options.mode == OutputMode::Json {
        let json = serde_json::to_string_pretty(&payload)?;
        ctx.print(&format!("{}\n", json))?;
    }
    obs::emit_incident_published(payload.failure_class.as_str(), &output_display);
    Ok(payload)
}
