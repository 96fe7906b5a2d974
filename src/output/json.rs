//! JSON output formatter for machine processing
//!
//! One object per selected engine, plus the `--save` result.

use crate::domain::EngineName;
use crate::orchestrator::{EngineOutcome, EngineReport, OrchestratorResult};
use crate::output::OutputFormatter;
use crate::probe::CurrentRuntime;
use crate::resolve::{Bottleneck, MajorRelease, PackageReport};
use semver::Version;
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Whether `--save` ran as a dry-run
    dry_run: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

/// JSON representation of the full result
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    project: &'a str,
    /// Lockfile or node_modules path
    source: String,
    packages: usize,
    engines: Vec<JsonEngine<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    save: Option<JsonSave<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonEngine<'a> {
    Resolved(JsonResolution<'a>),
    Failed { engine: &'a EngineName, error: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonResolution<'a> {
    engine: &'a EngineName,
    root: JsonRoot<'a>,
    graph: JsonGraph<'a>,
    verdict: &'static str,
    /// Range `--save` writes, when the root should change
    suggested: Option<&'a str>,
    bottlenecks: &'a [Bottleneck],
    latest_per_major: &'a [MajorRelease],
    current: Option<&'a CurrentRuntime>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonRoot<'a> {
    declared: Option<&'a str>,
    valid: &'a [Version],
    display: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonGraph<'a> {
    valid: &'a [Version],
    display: Option<&'a str>,
    packages: &'a [PackageReport],
    invalid: Vec<JsonInvalid<'a>>,
}

#[derive(Serialize)]
struct JsonInvalid<'a> {
    name: &'a str,
    range: &'a str,
    error: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSave<'a> {
    path: String,
    dry_run: bool,
    modified: bool,
    applied: Vec<JsonApplied<'a>>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    errors: &'a [String],
}

#[derive(Serialize)]
struct JsonApplied<'a> {
    engine: &'a EngineName,
    range: &'a str,
}

impl JsonFormatter {
    fn report_to_json(report: &EngineReport) -> JsonResolution<'_> {
        let resolution = &report.resolution;
        JsonResolution {
            engine: &resolution.engine,
            root: JsonRoot {
                declared: resolution.root.declared.as_deref(),
                valid: &resolution.root.valid,
                display: resolution.root_range.display(),
                invalid: resolution.root.invalid.as_ref().map(|e| e.message.clone()),
            },
            graph: JsonGraph {
                valid: &resolution.graph.valid,
                display: resolution.graph_range.display(),
                packages: &resolution.graph.packages,
                invalid: resolution
                    .graph
                    .invalid
                    .iter()
                    .map(|invalid| JsonInvalid {
                        name: &invalid.name,
                        range: &invalid.range,
                        error: &invalid.error.message,
                    })
                    .collect(),
            },
            verdict: resolution.verdict().kind(),
            suggested: report.save_range(),
            bottlenecks: &resolution.reconciliation.bottlenecks,
            latest_per_major: &resolution.latest_per_major,
            current: report.current.as_ref(),
        }
    }

    fn to_json<'a>(&self, result: &'a OrchestratorResult) -> JsonOutput<'a> {
        let engines = result
            .engines
            .iter()
            .map(|outcome| match outcome {
                EngineOutcome::Resolved(report) => JsonEngine::Resolved(Self::report_to_json(report)),
                EngineOutcome::Failed { engine, error } => JsonEngine::Failed {
                    engine,
                    error: error.to_string(),
                },
            })
            .collect();

        let save = result.write_result.as_ref().map(|write| JsonSave {
            path: write.path.display().to_string(),
            dry_run: self.dry_run,
            modified: write.file_modified,
            applied: write
                .applied
                .iter()
                .map(|(engine, range)| JsonApplied { engine, range })
                .collect(),
            errors: &write.errors,
        });

        JsonOutput {
            project: &result.project,
            source: result.inventory_source.to_string(),
            packages: result.package_count,
            engines,
            save,
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &OrchestratorResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = self.to_json(result);
        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)
    }
}
