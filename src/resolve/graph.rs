//! Intersecting every package constraint for one engine

use super::filter::filter_versions;
use crate::catalog::VersionCatalog;
use crate::domain::Constraint;
use crate::error::RangeError;
use crate::range::RangeSet;
use semver::Version;
use serde::Serialize;
use std::collections::HashSet;

/// Versions one package accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    /// Package name
    pub name: String,
    /// Declared range
    pub range: String,
    /// Catalog versions satisfying the range, descending
    pub valid: Vec<Version>,
}

/// A declared range that could not be parsed and was ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidConstraint {
    pub name: String,
    pub range: String,
    pub error: RangeError,
}

/// The versions the whole dependency graph accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphResolution {
    /// Versions accepted by every package, descending
    pub valid: Vec<Version>,
    /// Per-package results, in constraint order
    pub packages: Vec<PackageReport>,
    /// Constraints dropped because their range was malformed
    pub invalid: Vec<InvalidConstraint>,
}

impl GraphResolution {
    /// Returns true if at least one package restricted the result
    pub fn is_constrained(&self) -> bool {
        !self.packages.is_empty()
    }
}

/// Resolves the graph constraints that apply to the catalog's engine
///
/// No constraints means every catalog version is acceptable. Malformed
/// ranges are reported and otherwise treated as absent.
pub fn resolve_graph(constraints: &[Constraint], catalog: &VersionCatalog) -> GraphResolution {
    let mut packages = Vec::new();
    let mut invalid = Vec::new();

    for constraint in constraints
        .iter()
        .filter(|c| &c.engine == catalog.engine() && !c.source.is_root())
    {
        let name = constraint.source.name().to_string();
        match RangeSet::parse(&constraint.range) {
            Ok(range) => {
                let mut valid = filter_versions(catalog, &range);
                valid.reverse();
                packages.push(PackageReport {
                    name,
                    range: constraint.range.clone(),
                    valid,
                });
            }
            Err(error) => {
                tracing::warn!(
                    package = %name,
                    engine = %constraint.engine,
                    %error,
                    "ignoring malformed engines range"
                );
                invalid.push(InvalidConstraint {
                    name,
                    range: constraint.range.clone(),
                    error,
                });
            }
        }
    }

    let mut merged: Vec<Version> = catalog.versions().cloned().collect();
    for package in &packages {
        let accepted: HashSet<&Version> = package.valid.iter().collect();
        merged.retain(|version| accepted.contains(version));
    }
    merged.sort_by(|a, b| b.cmp(a));

    tracing::debug!(
        engine = %catalog.engine(),
        constraints = packages.len(),
        valid = merged.len(),
        "resolved dependency graph"
    );

    GraphResolution {
        valid: merged,
        packages,
        invalid,
    }
}
