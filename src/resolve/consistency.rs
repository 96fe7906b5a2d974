//! Verification that a range denotes exactly a version set

use super::filter::filter_versions;
use crate::catalog::VersionCatalog;
use crate::domain::EngineName;
use crate::error::SynthesisError;
use crate::range::RangeSet;
use semver::Version;

/// Returns true if filtering the catalog by `range` yields exactly `set`
///
/// `set` must be sorted ascending.
pub fn denotes(catalog: &VersionCatalog, set: &[Version], range: &RangeSet) -> bool {
    filter_versions(catalog, range) == set
}

/// Checks a synthesized range against the set it was built from
///
/// A mismatch is a synthesizer defect and carries everything needed to
/// reproduce it.
pub fn verify(
    engine: &EngineName,
    catalog: &VersionCatalog,
    set: &[Version],
    candidate: &RangeSet,
) -> Result<(), SynthesisError> {
    if denotes(catalog, set, candidate) {
        return Ok(());
    }

    tracing::error!(
        %engine,
        candidate = %candidate,
        desugared = %candidate.desugared(),
        "synthesized range failed verification"
    );
    Err(SynthesisError::Inconsistent {
        engine: engine.clone(),
        versions: set.iter().map(|v| v.to_string()).collect(),
        candidate: candidate.raw().to_string(),
    })
}
