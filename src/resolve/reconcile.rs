//! Comparing the root declaration with what the dependency graph supports

use super::graph::GraphResolution;
use super::root::RootResolution;
use super::synthesizer::{synthesize, SynthesizedRange};
use crate::catalog::VersionCatalog;
use crate::error::SynthesisError;
use chrono::NaiveDate;
use semver::Version;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Outcome of comparing the root range with the graph range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every version the root admits is supported by the graph
    Compatible,
    /// The root admits versions the graph does not support
    RootTooBroad { suggested: SynthesizedRange },
    /// No version satisfies both the root and the graph, including a root
    /// that admits no known version
    NoOverlap,
    /// The graph admits no version at all
    GraphUnsatisfiable,
}

impl Verdict {
    /// Stable identifier for machine-readable output
    pub fn kind(&self) -> &'static str {
        match self {
            Verdict::Compatible => "compatible",
            Verdict::RootTooBroad { .. } => "root-too-broad",
            Verdict::NoOverlap => "no-overlap",
            Verdict::GraphUnsatisfiable => "graph-unsatisfiable",
        }
    }

    /// The range the root should declare, if it should change
    pub fn suggested(&self) -> Option<&SynthesizedRange> {
        match self {
            Verdict::RootTooBroad { suggested } => Some(suggested),
            _ => None,
        }
    }

    pub fn is_compatible(&self) -> bool {
        matches!(self, Verdict::Compatible)
    }
}

/// A package that rejects versions the root range allows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bottleneck {
    pub name: String,
    pub range: String,
    /// Number of root-admitted versions this package rejects
    pub excluded: usize,
}

/// Newest release of one major line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MajorRelease {
    /// `18`, or `0.12` for pre-1.0 lines
    pub line: String,
    pub version: Version,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lts: Option<String>,
}

/// Verdict plus the packages responsible for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub verdict: Verdict,
    /// Most restrictive packages first
    pub bottlenecks: Vec<Bottleneck>,
}

/// Compares the root and graph resolutions of one engine
pub fn reconcile(
    root: &RootResolution,
    graph: &GraphResolution,
    catalog: &VersionCatalog,
) -> Result<Reconciliation, SynthesisError> {
    let bottlenecks = find_bottlenecks(root, graph);

    let verdict = if graph.is_constrained() && graph.valid.is_empty() {
        Verdict::GraphUnsatisfiable
    } else {
        let supported: HashSet<&Version> = graph.valid.iter().collect();
        let overlap: Vec<Version> = root
            .valid
            .iter()
            .filter(|v| supported.contains(v))
            .cloned()
            .collect();

        // A declared root that admits nothing shares nothing with the graph
        if overlap.is_empty() && (root.constrained || !root.valid.is_empty()) {
            Verdict::NoOverlap
        } else if overlap.len() == root.valid.len() {
            Verdict::Compatible
        } else {
            let suggested = synthesize(catalog.engine(), &overlap, catalog, true)?;
            Verdict::RootTooBroad { suggested }
        }
    };

    tracing::debug!(engine = %catalog.engine(), verdict = verdict.kind(), "reconciled");

    Ok(Reconciliation {
        verdict,
        bottlenecks,
    })
}

fn find_bottlenecks(root: &RootResolution, graph: &GraphResolution) -> Vec<Bottleneck> {
    let mut bottlenecks: Vec<Bottleneck> = graph
        .packages
        .iter()
        .filter_map(|package| {
            let accepted: HashSet<&Version> = package.valid.iter().collect();
            let excluded = root.valid.iter().filter(|v| !accepted.contains(v)).count();
            (excluded > 0).then(|| Bottleneck {
                name: package.name.clone(),
                range: package.range.clone(),
                excluded,
            })
        })
        .collect();

    bottlenecks.sort_by(|a, b| b.excluded.cmp(&a.excluded).then_with(|| a.name.cmp(&b.name)));
    bottlenecks
}

/// The newest version of every major line in `valid`, newest line first
///
/// Pre-1.0 versions are grouped by minor, as each minor is its own line.
pub fn latest_per_major(valid: &[Version], catalog: &VersionCatalog) -> Vec<MajorRelease> {
    let mut lines: BTreeMap<(u64, u64), &Version> = BTreeMap::new();
    for version in valid.iter().filter(|v| v.pre.is_empty()) {
        let key = if version.major == 0 {
            (0, version.minor)
        } else {
            (version.major, 0)
        };
        lines
            .entry(key)
            .and_modify(|latest| {
                if version > *latest {
                    *latest = version;
                }
            })
            .or_insert(version);
    }

    lines
        .into_iter()
        .rev()
        .map(|((major, minor), version)| {
            let entry = catalog.entry(version);
            MajorRelease {
                line: if major == 0 {
                    format!("0.{}", minor)
                } else {
                    major.to_string()
                },
                version: version.clone(),
                date: entry.and_then(|e| e.date),
                lts: entry.and_then(|e| e.lts.clone()),
            }
        })
        .collect()
}
