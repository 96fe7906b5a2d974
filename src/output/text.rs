//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Per-engine graph and root ranges with the verdict
//! - Bottleneck packages and the newest release of each valid major line
//! - Installed runtime check and `--save` results

use crate::domain::EngineName;
use crate::error::CatalogError;
use crate::manifest::WriteResult;
use crate::orchestrator::{EngineOutcome, EngineReport, OrchestratorResult};
use crate::output::{OutputFormatter, Verbosity};
use crate::resolve::{EngineResolution, Verdict};
use colored::{ColoredString, Colorize};
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    /// Whether `--save` ran as a dry-run
    dry_run: bool,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, dry_run: bool, color: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color,
        }
    }

    /// Apply a style only when colors are enabled
    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn ok_mark(&self) -> String {
        self.paint("✓", |s| s.green())
    }

    fn fail_mark(&self) -> String {
        self.paint("✗", |s| s.red().bold())
    }

    /// Get the dry-run prefix if applicable
    fn dry_run_prefix(&self) -> String {
        if self.dry_run {
            format!("{} ", self.paint("(dry-run)", |s| s.cyan()))
        } else {
            String::new()
        }
    }

    fn version_count(count: usize) -> String {
        if count == 1 {
            "1 version".to_string()
        } else {
            format!("{} versions", count)
        }
    }

    /// One line per engine
    fn format_quiet_line(
        &self,
        outcome: &EngineOutcome,
        saved: bool,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let report = match outcome {
            EngineOutcome::Resolved(report) => report,
            EngineOutcome::Failed { engine, error } => {
                return writeln!(writer, "{} {}: {}", self.fail_mark(), engine, error);
            }
        };

        let resolution = &report.resolution;
        let mark = if report.is_failure(saved) {
            self.fail_mark()
        } else {
            self.ok_mark()
        };
        let mut line = format!(
            "{} {}: {} {}",
            mark,
            resolution.engine,
            resolution.verdict().kind(),
            resolution.graph_range
        );
        if let Some(range) = report.save_range() {
            line.push_str(&format!(" (suggested {})", range));
        }
        writeln!(writer, "{}", line)
    }

    fn format_engine(
        &self,
        report: &EngineReport,
        saved: bool,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let resolution = &report.resolution;
        let engine = &resolution.engine;

        writeln!(
            writer,
            "{}",
            self.paint(engine.display_name(), |s| s.bold())
        )?;

        let graph_count = Self::version_count(resolution.graph.valid.len());
        writeln!(
            writer,
            "  {:<18} {}  {}",
            "dependency graph",
            self.paint(&resolution.graph_range.to_string(), |s| s.bright_white().bold()),
            self.paint(&format!("({})", graph_count), |s| s.dimmed())
        )?;

        let declared = match &resolution.root.declared {
            Some(range) => range.clone(),
            None => self.paint("(not set)", |s| s.dimmed()),
        };
        writeln!(writer, "  {:<18} {}", "package.json", declared)?;
        if let Some(error) = &resolution.root.invalid {
            writeln!(
                writer,
                "  {}",
                self.paint(&format!("ignored: {}", error), |s| s.yellow())
            )?;
        }

        self.format_verdict(resolution, saved, writer)?;

        if !resolution.reconciliation.bottlenecks.is_empty() {
            writeln!(writer, "  {}", self.paint("narrowed by:", |s| s.dimmed()))?;
            let width = resolution
                .reconciliation
                .bottlenecks
                .iter()
                .map(|b| b.name.len())
                .max()
                .unwrap_or(0);
            for bottleneck in &resolution.reconciliation.bottlenecks {
                writeln!(
                    writer,
                    "    {:width$}  {}  {}",
                    bottleneck.name,
                    bottleneck.range,
                    self.paint(
                        &format!("excludes {}", Self::version_count(bottleneck.excluded)),
                        |s| s.dimmed()
                    ),
                    width = width
                )?;
            }
        }

        if !resolution.latest_per_major.is_empty() {
            writeln!(writer, "  {}", self.paint("latest per major:", |s| s.dimmed()))?;
            for release in &resolution.latest_per_major {
                let mut line = format!("    {:<6} {}", release.line, release.version);
                if let Some(date) = release.date {
                    line.push_str(&format!("  {}", date.format("%Y/%m/%d")));
                }
                if let Some(lts) = &release.lts {
                    line.push_str(&format!("  {}", self.paint(&format!("LTS {}", lts), |s| s.cyan())));
                }
                writeln!(writer, "{}", line)?;
            }
        }

        if let Some(current) = &report.current {
            match &current.version {
                Some(version) if current.satisfies => {
                    writeln!(writer, "  installed {} {}", version, self.ok_mark())?
                }
                Some(version) => writeln!(
                    writer,
                    "  installed {} {} {}",
                    version,
                    self.fail_mark(),
                    self.paint("not supported by the dependency graph", |s| s.red())
                )?,
                None => writeln!(
                    writer,
                    "  installed {}",
                    self.paint(&format!("({} not found)", engine), |s| s.dimmed())
                )?,
            }
        }

        if self.verbosity == Verbosity::Verbose {
            self.format_packages(resolution, writer)?;
        }

        writeln!(writer)
    }

    fn format_verdict(
        &self,
        resolution: &EngineResolution,
        saved: bool,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let engine = &resolution.engine;
        match resolution.verdict() {
            Verdict::Compatible => writeln!(
                writer,
                "  {} engines.{} matches the dependency graph",
                self.ok_mark(),
                engine
            ),
            Verdict::RootTooBroad { suggested } => {
                let mark = if saved { self.ok_mark() } else { self.fail_mark() };
                writeln!(
                    writer,
                    "  {} engines.{} allows versions the dependency graph does not support",
                    mark, engine
                )?;
                writeln!(
                    writer,
                    "    suggested: {}",
                    self.paint(&suggested.to_string(), |s| s.green().bold())
                )
            }
            Verdict::NoOverlap => {
                let mark = if saved { self.ok_mark() } else { self.fail_mark() };
                writeln!(
                    writer,
                    "  {} engines.{} shares no version with the dependency graph",
                    mark, engine
                )?;
                writeln!(
                    writer,
                    "    suggested: {}",
                    self.paint(&resolution.graph_range.to_string(), |s| s.green().bold())
                )
            }
            Verdict::GraphUnsatisfiable => writeln!(
                writer,
                "  {} no {} version satisfies every dependency",
                self.fail_mark(),
                engine
            ),
        }
    }

    /// Every contributing package and every ignored declaration
    fn format_packages(
        &self,
        resolution: &EngineResolution,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let graph = &resolution.graph;
        if !graph.packages.is_empty() {
            writeln!(writer, "  {}", self.paint("packages:", |s| s.dimmed()))?;
            let width = graph.packages.iter().map(|p| p.name.len()).max().unwrap_or(0);
            for package in &graph.packages {
                writeln!(
                    writer,
                    "    {:width$}  {}  {}",
                    package.name,
                    package.range,
                    self.paint(&format!("({})", Self::version_count(package.valid.len())), |s| {
                        s.dimmed()
                    }),
                    width = width
                )?;
            }
        }
        if !graph.invalid.is_empty() {
            writeln!(writer, "  {}", self.paint("ignored:", |s| s.yellow()))?;
            for invalid in &graph.invalid {
                writeln!(writer, "    {}  {}", invalid.name, invalid.error.message)?;
            }
        }
        Ok(())
    }

    fn format_failure(
        &self,
        engine: &EngineName,
        error: &CatalogError,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        writeln!(
            writer,
            "{}",
            self.paint(engine.display_name(), |s| s.bold())
        )?;
        writeln!(writer, "  {} {}", self.fail_mark(), error)?;
        writeln!(writer)
    }

    fn format_write_result(
        &self,
        write: &WriteResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let prefix = self.dry_run_prefix();
        let path = write.path.display().to_string();

        if !write.has_updates() && !write.has_errors() {
            return writeln!(writer, "{}{} is up to date", prefix, path);
        }

        for (engine, range) in &write.applied {
            writeln!(
                writer,
                "{}{} engines.{} = {}",
                prefix,
                self.paint(&path, |s| s.bold()),
                engine,
                self.paint(&format!("\"{}\"", range), |s| s.green())
            )?;
        }
        for error in &write.errors {
            writeln!(writer, "{} {}", self.fail_mark(), error)?;
        }
        Ok(())
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &OrchestratorResult, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            for outcome in &result.engines {
                self.format_quiet_line(outcome, result.was_saved(outcome.engine()), writer)?;
            }
            return Ok(());
        }

        writeln!(
            writer,
            "{} {}",
            self.paint(&result.project, |s| s.bold()),
            self.paint(
                &format!(
                    "({}, {} package{})",
                    result.inventory_source,
                    result.package_count,
                    if result.package_count == 1 { "" } else { "s" }
                ),
                |s| s.dimmed()
            )
        )?;
        writeln!(writer)?;

        for outcome in &result.engines {
            match outcome {
                EngineOutcome::Resolved(report) => {
                    let saved = result.was_saved(&report.resolution.engine);
                    self.format_engine(report, saved, writer)?;
                }
                EngineOutcome::Failed { engine, error } => {
                    self.format_failure(engine, error, writer)?;
                }
            }
        }

        if let Some(write) = &result.write_result {
            self.format_write_result(write, writer)?;
        }

        Ok(())
    }
}
