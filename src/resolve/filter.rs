//! Filtering a catalog by a range

use crate::catalog::VersionCatalog;
use crate::range::RangeSet;
use semver::Version;

/// The catalog versions satisfying `range`, ascending
pub fn filter_versions(catalog: &VersionCatalog, range: &RangeSet) -> Vec<Version> {
    catalog
        .versions()
        .filter(|version| range.satisfies(version))
        .cloned()
        .collect()
}
