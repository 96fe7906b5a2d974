//! CLI argument parsing module for engine-compat

use crate::domain::{EngineName, TriState};
use crate::error::ConfigError;
use crate::inventory::InventoryMode;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Parse inventory mode: auto, actual or virtual
fn parse_mode(s: &str) -> Result<InventoryMode, String> {
    s.parse()
}

/// Parse an engine name, rejecting blanks
fn parse_engine(s: &str) -> Result<String, String> {
    let name = s.trim();
    if name.is_empty() {
        return Err("empty engine name".to_string());
    }
    if name.contains(char::is_whitespace) {
        return Err(format!("invalid engine name: {}", name));
    }
    Ok(name.to_string())
}

/// Engine compatibility checker for Node.js projects
#[derive(Parser, Debug, Clone)]
#[command(
    name = "engine-compat",
    version,
    about = "Find the engine versions your dependency graph supports"
)]
pub struct CliArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    // Inventory options
    /// Dependency tree to read: auto, actual (node_modules) or virtual (lockfile)
    #[arg(long, default_value = "auto", value_parser = parse_mode)]
    pub mode: InventoryMode,

    /// Engines to check (can be specified multiple times; default: node)
    #[arg(long = "engines", action = ArgAction::Append, value_delimiter = ',', value_parser = parse_engine)]
    pub engines: Vec<String>,

    /// Include devDependencies
    #[arg(long, overrides_with = "production")]
    pub dev: bool,

    /// Only production dependencies (default)
    #[arg(long, overrides_with = "dev")]
    pub production: bool,

    // Runtime check
    /// Check the installed engine version (default: on, unless --save)
    #[arg(long, overrides_with = "no_current")]
    pub current: bool,

    /// Skip the installed engine version check
    #[arg(long = "no-current", overrides_with = "current")]
    pub no_current: bool,

    // Manifest update
    /// Write the suggested range to package.json engines
    #[arg(long)]
    pub save: bool,

    /// Dry run mode - show what --save would write without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    // Catalog options
    /// Read engine versions from a local JSON file instead of the network
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Base URL of the Node.js dist mirror
    #[arg(long, value_name = "URL")]
    pub dist_url: Option<String>,

    // Output options
    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// `--dev` / `--production` as given
    pub fn dev_flag(&self) -> TriState {
        TriState::from_flags(self.dev, self.production)
    }

    /// `--current` / `--no-current` as given
    pub fn current_flag(&self) -> TriState {
        TriState::from_flags(self.current, self.no_current)
    }

    /// Whether dev-only packages are part of the graph
    pub fn include_dev(&self) -> bool {
        self.dev_flag().resolve(false)
    }

    /// Whether to check the installed runtime; saving turns the default off
    pub fn check_current(&self) -> bool {
        self.current_flag().resolve(!self.save)
    }

    /// Selected engines, de-duplicated in order; `node` when none given
    pub fn engine_names(&self) -> Vec<EngineName> {
        let mut names: Vec<EngineName> = Vec::new();
        for engine in &self.engines {
            let engine = EngineName::new(engine.as_str());
            if !names.contains(&engine) {
                names.push(engine);
            }
        }
        if names.is_empty() {
            names.push(EngineName::node());
        }
        names
    }

    /// Rejects option combinations that cannot be honored
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.is_some() && self.engine_names().len() > 1 {
            return Err(ConfigError::ConflictingOptions {
                message: "--catalog provides versions for a single engine".to_string(),
            });
        }
        if self.dry_run && !self.save {
            return Err(ConfigError::ConflictingOptions {
                message: "--dry-run only applies together with --save".to_string(),
            });
        }
        if self.json && self.verbose {
            return Err(ConfigError::ConflictingOptions {
                message: "--verbose cannot be combined with --json".to_string(),
            });
        }
        if !self.path.is_dir() {
            return Err(ConfigError::InvalidPath {
                path: self.path.clone(),
                message: "not a directory".to_string(),
            });
        }
        Ok(())
    }
}
