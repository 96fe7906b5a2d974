//! Dependency inventory loading
//!
//! This module provides functionality to:
//! - Read the locked (virtual) tree from package-lock.json / npm-shrinkwrap.json
//! - Read the installed (actual) tree from node_modules
//! - Pick between the two automatically

mod lockfile;
mod node_modules;

pub use lockfile::{find_lockfile, parse_lockfile, read_lockfile, LOCKFILES};
pub use node_modules::{read_node_modules, NODE_MODULES};

use crate::domain::PackageRecord;
use crate::error::InventoryError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which dependency tree to read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InventoryMode {
    /// Lockfile if present, otherwise node_modules
    #[default]
    Auto,
    /// Installed packages in node_modules
    Actual,
    /// Packages recorded in the lockfile
    Virtual,
}

impl InventoryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryMode::Auto => "auto",
            InventoryMode::Actual => "actual",
            InventoryMode::Virtual => "virtual",
        }
    }
}

impl fmt::Display for InventoryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InventoryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(InventoryMode::Auto),
            "actual" => Ok(InventoryMode::Actual),
            "virtual" => Ok(InventoryMode::Virtual),
            other => Err(format!(
                "invalid mode '{}': expected auto, actual or virtual",
                other
            )),
        }
    }
}

/// Where an inventory was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventorySource {
    Lockfile(PathBuf),
    NodeModules(PathBuf),
}

impl fmt::Display for InventorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventorySource::Lockfile(path) | InventorySource::NodeModules(path) => {
                write!(f, "{}", path.display())
            }
        }
    }
}

/// The packages of one dependency tree
#[derive(Debug, Clone)]
pub struct Inventory {
    pub source: InventorySource,
    pub records: Vec<PackageRecord>,
}

/// Loads the dependency tree of the project at `root`
///
/// Dev-only packages are dropped unless `include_dev` is set.
pub fn load_inventory(
    root: &Path,
    mode: InventoryMode,
    include_dev: bool,
) -> Result<Inventory, InventoryError> {
    let modules = root.join(NODE_MODULES);

    let (source, mut records) = match mode {
        InventoryMode::Virtual => {
            let lockfile = find_lockfile(root).ok_or_else(|| InventoryError::Missing {
                what: "package-lock.json or npm-shrinkwrap.json",
                path: root.to_path_buf(),
            })?;
            let records = read_lockfile(&lockfile)?;
            (InventorySource::Lockfile(lockfile), records)
        }
        InventoryMode::Actual => {
            if !modules.is_dir() {
                return Err(InventoryError::Missing {
                    what: NODE_MODULES,
                    path: root.to_path_buf(),
                });
            }
            (InventorySource::NodeModules(modules), read_node_modules(root)?)
        }
        InventoryMode::Auto => {
            if let Some(lockfile) = find_lockfile(root) {
                let records = read_lockfile(&lockfile)?;
                (InventorySource::Lockfile(lockfile), records)
            } else if modules.is_dir() {
                (InventorySource::NodeModules(modules), read_node_modules(root)?)
            } else {
                return Err(InventoryError::NoTree {
                    path: root.to_path_buf(),
                });
            }
        }
    };

    let total = records.len();
    if !include_dev {
        records.retain(|record| !record.dev);
    }

    tracing::info!(
        %source,
        %mode,
        total,
        kept = records.len(),
        "loaded dependency inventory"
    );

    Ok(Inventory { source, records })
}
