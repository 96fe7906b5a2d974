//! Range synthesis
//!
//! Turns a set of acceptable versions back into a short range expression:
//! - Versions are grouped into runs of consecutive catalog entries that each
//!   fit one caret window
//! - A single `>= X.Y` threshold is preferred when it denotes the set exactly
//! - Otherwise the runs are joined with `||`, highest first. A run is a caret,
//!   unless the caret would admit an excluded catalog version; then it is
//!   closed as `>= A < B` or pinned to its single version

use super::consistency::{denotes, verify};
use crate::catalog::VersionCatalog;
use crate::domain::EngineName;
use crate::error::SynthesisError;
use crate::range::RangeSet;
use regex::Regex;
use semver::Version;
use std::fmt;
use std::sync::LazyLock;

/// Trailing `.0` component before a space or end of string
static TRAILING_ZERO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.0(\s|$)").unwrap());

/// A range expression denoting a set of versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesizedRange {
    /// No constraint applies: `*`
    Any,
    /// A verified expression and its terser display form
    Exact { range: RangeSet, display: String },
    /// Constraints exist but no known version satisfies them
    Unsatisfiable,
}

impl SynthesizedRange {
    /// The display form, or None when nothing is satisfiable
    pub fn display(&self) -> Option<&str> {
        match self {
            SynthesizedRange::Any => Some("*"),
            SynthesizedRange::Exact { display, .. } => Some(display),
            SynthesizedRange::Unsatisfiable => None,
        }
    }

    /// The verified expression, if one was synthesized
    pub fn range(&self) -> Option<&RangeSet> {
        match self {
            SynthesizedRange::Exact { range, .. } => Some(range),
            _ => None,
        }
    }

    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, SynthesizedRange::Unsatisfiable)
    }
}

impl fmt::Display for SynthesizedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display() {
            Some(display) => write!(f, "{}", display),
            None => write!(f, "no version"),
        }
    }
}

/// `M.m`, or `M.m.p` when the patch (or a pre-release) matters
fn anchor_version(version: &Version) -> String {
    if !version.pre.is_empty() {
        version.to_string()
    } else if version.patch == 0 {
        format!("{}.{}", version.major, version.minor)
    } else {
        format!("{}.{}.{}", version.major, version.minor, version.patch)
    }
}

/// Caret expression for a run anchor
fn caret(anchor: &Version) -> String {
    format!("^{}", anchor_version(anchor))
}

fn parse_generated(engine: &EngineName, expression: &str) -> Result<RangeSet, SynthesisError> {
    // Generated expressions always parse; a failure is reported like any other mismatch
    RangeSet::parse(expression).map_err(|e| {
        tracing::error!(%engine, %expression, error = %e, "generated range does not parse");
        SynthesisError::Inconsistent {
            engine: engine.clone(),
            versions: Vec::new(),
            candidate: expression.to_string(),
        }
    })
}

/// Consecutive catalog versions that all belong to the set and fit one
/// caret window
#[derive(Debug)]
struct Run {
    anchor: Version,
    window: RangeSet,
    len: usize,
    /// First excluded catalog version inside the window, if any
    upper: Option<Version>,
}

impl Run {
    /// `^anchor` when the caret admits nothing outside the set, otherwise
    /// the exact version or `>= anchor < upper`
    fn expression(&self) -> String {
        match &self.upper {
            None => caret(&self.anchor),
            Some(_) if self.len == 1 => self.anchor.to_string(),
            Some(upper) => format!(">= {} < {}", anchor_version(&self.anchor), upper),
        }
    }
}

/// Walks the catalog in ascending order and groups the set's members into runs
fn catalog_runs(
    engine: &EngineName,
    catalog: &VersionCatalog,
    ascending: &[Version],
) -> Result<Vec<Run>, SynthesisError> {
    let mut runs: Vec<Run> = Vec::new();
    let mut current: Option<Run> = None;

    for version in catalog.versions() {
        let member = ascending.binary_search(version).is_ok();
        let admitted = current.as_ref().is_some_and(|r| r.window.satisfies(version));

        match (member, admitted) {
            (true, true) => {
                if let Some(run) = current.as_mut() {
                    run.len += 1;
                }
            }
            (true, false) => {
                runs.extend(current.take());
                current = Some(Run {
                    anchor: version.clone(),
                    window: parse_generated(engine, &caret(version))?,
                    len: 1,
                    upper: None,
                });
            }
            (false, true) => {
                if let Some(mut run) = current.take() {
                    run.upper = Some(version.clone());
                    runs.push(run);
                }
            }
            (false, false) => {}
        }
    }
    runs.extend(current);

    Ok(runs)
}

/// Strips trailing `.0` components, keeping the original when that would
/// change which catalog versions match
fn cosmetic(catalog: &VersionCatalog, ascending: &[Version], range: &RangeSet) -> String {
    let stripped = TRAILING_ZERO_RE.replace_all(range.raw(), "$1").into_owned();
    if stripped == range.raw() {
        return stripped;
    }

    match RangeSet::parse(&stripped) {
        Ok(parsed) if denotes(catalog, ascending, &parsed) => stripped,
        _ => {
            tracing::debug!(range = %range, %stripped, "keeping unstripped display range");
            range.raw().to_string()
        }
    }
}

/// Synthesizes the shortest range denoting `valid` over the catalog
///
/// `constrained` tells whether any constraint contributed to `valid`.
pub fn synthesize(
    engine: &EngineName,
    valid: &[Version],
    catalog: &VersionCatalog,
    constrained: bool,
) -> Result<SynthesizedRange, SynthesisError> {
    if !constrained {
        return Ok(SynthesizedRange::Any);
    }
    if valid.is_empty() {
        return Ok(SynthesizedRange::Unsatisfiable);
    }

    let mut ascending = valid.to_vec();
    ascending.sort();
    ascending.dedup();

    let runs = catalog_runs(engine, catalog, &ascending)?;

    let candidate = match runs.first() {
        Some(lowest) => {
            let threshold =
                parse_generated(engine, &format!(">= {}", anchor_version(&lowest.anchor)))?;
            if denotes(catalog, &ascending, &threshold) {
                threshold
            } else {
                let union: Vec<String> = runs.iter().rev().map(Run::expression).collect();
                parse_generated(engine, &union.join(" || "))?
            }
        }
        None => return Ok(SynthesizedRange::Unsatisfiable),
    };

    verify(engine, catalog, &ascending, &candidate)?;

    let shown = cosmetic(catalog, &ascending, &candidate);
    tracing::debug!(%engine, range = %candidate, display = %shown, "synthesized range");

    Ok(SynthesizedRange::Exact {
        range: candidate,
        display: shown,
    })
}
