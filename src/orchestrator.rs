//! Orchestrator coordinating the whole check
//!
//! This module provides:
//! - Workflow coordination: read manifest → acquire (tree + catalogs) → resolve → save
//! - Concurrent acquisition of the dependency tree and every engine catalog
//! - Per-engine failure isolation for catalog acquisition
//! - Dry-run support for `--save`

use crate::catalog::{create_source, HttpClient};
use crate::cli::CliArgs;
use crate::domain::EngineName;
use crate::error::{AppError, CatalogError};
use crate::inventory::{load_inventory, InventoryMode, InventorySource};
use crate::manifest::{ManifestWriter, RootManifest, WriteResult};
use crate::probe::{check_current, CurrentRuntime, RuntimeProbe, SystemRuntimeProbe};
use crate::progress::Progress;
use crate::resolve::{extract_constraints, resolve_engine, EngineResolution, Verdict};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::task::JoinSet;

/// Options controlling one run, derived from the command line
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Project directory
    pub root: PathBuf,
    pub mode: InventoryMode,
    pub engines: Vec<EngineName>,
    pub include_dev: bool,
    /// Check the installed runtime against the graph
    pub check_current: bool,
    pub save: bool,
    pub dry_run: bool,
    /// Offline catalog file
    pub catalog_file: Option<PathBuf>,
    /// Node.js dist mirror
    pub dist_url: Option<String>,
}

impl ResolveOptions {
    /// Build options from parsed CLI arguments
    pub fn from_cli(args: &CliArgs) -> Self {
        Self {
            root: args.path.clone(),
            mode: args.mode,
            engines: args.engine_names(),
            include_dev: args.include_dev(),
            check_current: args.check_current(),
            save: args.save,
            dry_run: args.dry_run,
            catalog_file: args.catalog.clone(),
            dist_url: args.dist_url.clone(),
        }
    }

    /// Options for a project directory with every default applied
    pub fn for_path(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mode: InventoryMode::Auto,
            engines: vec![EngineName::node()],
            include_dev: false,
            check_current: true,
            save: false,
            dry_run: false,
            catalog_file: None,
            dist_url: None,
        }
    }
}

/// Result for one engine whose catalog was acquired
#[derive(Debug, Clone)]
pub struct EngineReport {
    pub resolution: EngineResolution,
    /// Installed runtime, when the check ran
    pub current: Option<CurrentRuntime>,
}

impl EngineReport {
    /// The range `--save` writes, if the root declaration should change
    pub fn save_range(&self) -> Option<&str> {
        match self.resolution.verdict() {
            Verdict::RootTooBroad { suggested } => suggested.display(),
            Verdict::NoOverlap => self.resolution.graph_range.display(),
            _ => None,
        }
    }

    /// Returns true if an installed runtime was found and is outside the graph
    pub fn current_rejected(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|c| c.version.is_some() && !c.satisfies)
    }

    /// Returns true if this engine should fail the run
    ///
    /// A broken root declaration counts as fixed once it was written.
    pub fn is_failure(&self, saved: bool) -> bool {
        let verdict_failed = match self.resolution.verdict() {
            Verdict::Compatible => false,
            Verdict::RootTooBroad { .. } | Verdict::NoOverlap => !saved,
            Verdict::GraphUnsatisfiable => true,
        };
        verdict_failed || self.current_rejected()
    }
}

/// Outcome for one selected engine
#[derive(Debug)]
pub enum EngineOutcome {
    Resolved(Box<EngineReport>),
    /// The catalog could not be acquired
    Failed { engine: EngineName, error: CatalogError },
}

impl EngineOutcome {
    pub fn engine(&self) -> &EngineName {
        match self {
            EngineOutcome::Resolved(report) => &report.resolution.engine,
            EngineOutcome::Failed { engine, .. } => engine,
        }
    }

    pub fn report(&self) -> Option<&EngineReport> {
        match self {
            EngineOutcome::Resolved(report) => Some(report),
            EngineOutcome::Failed { .. } => None,
        }
    }
}

/// Result of running the orchestrator
#[derive(Debug)]
pub struct OrchestratorResult {
    /// Root package name (or directory name)
    pub project: String,
    /// Where the dependency tree came from
    pub inventory_source: InventorySource,
    /// Packages considered
    pub package_count: usize,
    /// One outcome per selected engine, in selection order
    pub engines: Vec<EngineOutcome>,
    /// Result of `--save`, when requested
    pub write_result: Option<WriteResult>,
}

impl OrchestratorResult {
    /// Returns true if `engine` was written to the manifest
    pub fn was_saved(&self, engine: &EngineName) -> bool {
        self.write_result.as_ref().is_some_and(|w| {
            w.file_modified && w.applied.iter().any(|(applied, _)| applied == engine)
        })
    }

    /// Returns true if any engine's catalog could not be acquired
    pub fn has_acquisition_errors(&self) -> bool {
        self.engines
            .iter()
            .any(|o| matches!(o, EngineOutcome::Failed { .. }))
    }

    /// Returns true if any resolved engine failed its checks
    pub fn has_failures(&self) -> bool {
        self.engines.iter().filter_map(EngineOutcome::report).any(|report| {
            report.is_failure(self.was_saved(&report.resolution.engine))
        })
    }

    /// Process exit code: 1 for failed checks, 2 for acquisition errors, else 0
    pub fn exit_code(&self) -> u8 {
        if self.has_failures() {
            1
        } else if self.has_acquisition_errors() {
            2
        } else {
            0
        }
    }
}

/// Orchestrator for coordinating the check workflow
pub struct Orchestrator {
    options: ResolveOptions,
    /// HTTP client for catalog requests
    client: HttpClient,
    probe: Box<dyn RuntimeProbe + Send + Sync>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given options
    pub fn new(options: ResolveOptions) -> Result<Self, AppError> {
        let client = HttpClient::new()?;
        Ok(Self::with_client(options, client))
    }

    /// Create an orchestrator with a custom HTTP client (for testing)
    pub fn with_client(options: ResolveOptions, client: HttpClient) -> Self {
        Self {
            options,
            client,
            probe: Box::new(SystemRuntimeProbe::new()),
        }
    }

    /// Replace the runtime probe
    pub fn with_probe(mut self, probe: impl RuntimeProbe + Send + Sync + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Run the workflow
    pub async fn run(&self) -> Result<OrchestratorResult, AppError> {
        self.run_with_progress(Progress::disabled()).await
    }

    /// Run the workflow with progress display
    pub async fn run_with_progress(
        &self,
        mut progress: Progress,
    ) -> Result<OrchestratorResult, AppError> {
        let options = &self.options;
        let manifest = RootManifest::read(&options.root)?;

        let sources = options
            .engines
            .iter()
            .map(|engine| {
                create_source(
                    engine,
                    options.catalog_file.as_ref(),
                    options.dist_url.as_deref(),
                    self.client.clone(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        progress.start(sources.len() as u64 + 1, "Loading dependency tree and versions");

        let root = options.root.clone();
        let mode = options.mode;
        let include_dev = options.include_dev;
        let inventory_task =
            tokio::task::spawn_blocking(move || load_inventory(&root, mode, include_dev));

        let mut fetches = JoinSet::new();
        for source in sources {
            fetches.spawn(async move {
                let engine = source.engine().clone();
                tracing::debug!(%engine, source = %source.source_name(), "fetching catalog");
                (engine, source.fetch().await)
            });
        }

        let progress_ref = &progress;
        let (inventory, catalogs) = tokio::join!(
            async move {
                let inventory = inventory_task.await;
                progress_ref.inc("dependency tree");
                inventory
            },
            async move {
                let mut catalogs = HashMap::new();
                while let Some(joined) = fetches.join_next().await {
                    let (engine, result) = joined?;
                    progress_ref.inc(&format!("{} versions", engine));
                    catalogs.insert(engine, result);
                }
                Ok::<_, AppError>(catalogs)
            }
        );
        progress.finish_and_clear();

        let inventory = inventory??;
        let mut catalogs = catalogs?;

        let constraints = extract_constraints(&inventory.records, &options.engines);
        tracing::debug!(count = constraints.len(), "extracted engine constraints");

        let mut engines = Vec::with_capacity(options.engines.len());
        for engine in &options.engines {
            let catalog = match catalogs.remove(engine) {
                Some(Ok(catalog)) => catalog,
                Some(Err(error)) => {
                    tracing::warn!(%engine, %error, "catalog acquisition failed");
                    engines.push(EngineOutcome::Failed {
                        engine: engine.clone(),
                        error,
                    });
                    continue;
                }
                None => continue,
            };

            let resolution = resolve_engine(&catalog, manifest.engine_range(engine), &constraints)?;
            let current = options
                .check_current
                .then(|| check_current(self.probe.as_ref(), engine, &resolution.graph.valid));

            engines.push(EngineOutcome::Resolved(Box::new(EngineReport {
                resolution,
                current,
            })));
        }

        let write_result = if options.save {
            let updates: Vec<(EngineName, String)> = engines
                .iter()
                .filter_map(EngineOutcome::report)
                .filter_map(|report| {
                    report
                        .save_range()
                        .map(|range| (report.resolution.engine.clone(), range.to_string()))
                })
                .collect();
            Some(ManifestWriter::new(options.dry_run).apply_updates(&manifest, &updates)?)
        } else {
            None
        };

        Ok(OrchestratorResult {
            project: manifest.label(),
            inventory_source: inventory.source,
            package_count: inventory.records.len(),
            engines,
            write_result,
        })
    }
}
