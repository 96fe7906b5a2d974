//! Package records collected from a dependency tree

use super::EngineName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One installed (or locked) package and the engine ranges it declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package name
    pub name: String,
    /// Installed version, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Install location relative to the project root (e.g. `node_modules/a/node_modules/b`)
    pub path: PathBuf,
    /// Whether the package ships inside another package's bundle
    pub bundled: bool,
    /// Whether the package is only reachable through dev dependencies
    pub dev: bool,
    /// Declared engine ranges, keyed by engine name
    pub engines: BTreeMap<EngineName, String>,
}

impl PackageRecord {
    /// Creates a new production, non-bundled record with no engine declarations
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version: None,
            path: path.into(),
            bundled: false,
            dev: false,
            engines: BTreeMap::new(),
        }
    }

    /// Sets the installed version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Marks the record as bundled
    pub fn bundled(mut self, bundled: bool) -> Self {
        self.bundled = bundled;
        self
    }

    /// Marks the record as a dev-only package
    pub fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    /// Adds an engine declaration
    pub fn with_engine(mut self, engine: impl Into<EngineName>, range: impl Into<String>) -> Self {
        self.engines.insert(engine.into(), range.into());
        self
    }

    /// Returns the declared range for an engine, if any
    pub fn engine_range(&self, engine: &EngineName) -> Option<&str> {
        self.engines.get(engine).map(String::as_str)
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version)?,
            None => write!(f, "{}", self.name)?,
        }
        if self.bundled {
            write!(f, " (bundled)")?;
        }
        if self.dev {
            write!(f, " (dev)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = PackageRecord::new("lodash", "node_modules/lodash")
            .with_version("4.17.21")
            .with_engine("node", ">= 4");

        assert_eq!(record.name, "lodash");
        assert_eq!(record.version.as_deref(), Some("4.17.21"));
        assert!(!record.bundled);
        assert!(!record.dev);
        assert_eq!(record.engine_range(&EngineName::node()), Some(">= 4"));
        assert_eq!(record.engine_range(&EngineName::new("npm")), None);
    }

    #[test]
    fn test_display_with_markers() {
        let record = PackageRecord::new("inner", "node_modules/outer/node_modules/inner")
            .with_version("1.0.0")
            .bundled(true)
            .dev(true);
        assert_eq!(format!("{}", record), "inner@1.0.0 (bundled) (dev)");
    }

    #[test]
    fn test_display_without_version() {
        let record = PackageRecord::new("pkg", "node_modules/pkg");
        assert_eq!(format!("{}", record), "pkg");
    }
}
