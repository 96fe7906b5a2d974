//! Engine constraints declared by packages or by the project itself

use super::EngineName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a constraint was declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintSource {
    /// The project's own manifest
    Root,
    /// A package in the dependency graph
    Package(String),
}

impl ConstraintSource {
    /// Returns the package name, or `"root"` for the project itself
    pub fn name(&self) -> &str {
        match self {
            ConstraintSource::Root => "root",
            ConstraintSource::Package(name) => name,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, ConstraintSource::Root)
    }
}

impl fmt::Display for ConstraintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A declared range for one engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Constraint {
    /// Who declared it
    pub source: ConstraintSource,
    /// Which engine it applies to
    pub engine: EngineName,
    /// The raw range expression
    pub range: String,
}

impl Constraint {
    /// Creates a constraint declared by a package
    pub fn package(
        name: impl Into<String>,
        engine: impl Into<EngineName>,
        range: impl Into<String>,
    ) -> Self {
        Self {
            source: ConstraintSource::Package(name.into()),
            engine: engine.into(),
            range: range.into(),
        }
    }

    /// Creates a constraint declared by the project itself
    pub fn root(engine: impl Into<EngineName>, range: impl Into<String>) -> Self {
        Self {
            source: ConstraintSource::Root,
            engine: engine.into(),
            range: range.into(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requires {} {}", self.source, self.engine, self.range)
    }
}
