//! Resolution of the project's own declared range

use super::filter::filter_versions;
use crate::catalog::VersionCatalog;
use crate::domain::Constraint;
use crate::error::RangeError;
use crate::range::{is_wildcard, RangeSet};
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

/// Matches `=N` where the digit directly follows a bare `=`
static BARE_EQ_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(^|[^<>=])=(\d)").unwrap());

/// The versions the root project's declaration admits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootResolution {
    /// The range as written in the manifest, if any
    pub declared: Option<String>,
    /// The range actually applied (`*` when absent or malformed)
    pub effective: RangeSet,
    /// Whether the declaration restricts anything
    pub constrained: bool,
    /// Catalog versions admitted, descending
    pub valid: Vec<Version>,
    /// Parse failure of the declared range, if it was malformed
    pub invalid: Option<RangeError>,
}

/// Rewrites `=14` as `= 14`, leaving `>=14` and `<=14` untouched
pub fn normalize_root_range(range: &str) -> String {
    BARE_EQ_RE.replace_all(range.trim(), "${1}= ${2}").into_owned()
}

/// Resolves the root declaration for the catalog's engine
///
/// A constraint declared for another engine counts as absent.
pub fn resolve_root(declared: Option<&Constraint>, catalog: &VersionCatalog) -> RootResolution {
    let declared = declared
        .filter(|c| &c.engine == catalog.engine())
        .map(|c| c.range.as_str());
    let mut invalid = None;

    let effective = match declared {
        Some(range) if !is_wildcard(range) => {
            let normalized = normalize_root_range(range);
            match RangeSet::parse(&normalized) {
                Ok(parsed) => parsed,
                Err(error) => {
                    tracing::warn!(
                        engine = %catalog.engine(),
                        %error,
                        "ignoring malformed root engines range"
                    );
                    invalid = Some(error);
                    RangeSet::any()
                }
            }
        }
        _ => RangeSet::any(),
    };

    let mut valid = filter_versions(catalog, &effective);
    valid.reverse();

    RootResolution {
        declared: declared.map(str::to_string),
        constrained: !effective.is_any(),
        effective,
        valid,
        invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EngineName;

    fn declared(range: &str) -> Constraint {
        Constraint::root("node", range)
    }

    fn catalog() -> VersionCatalog {
        VersionCatalog::from_versions(
            EngineName::node(),
            ["12.0.0", "14.0.0", "14.5.0", "16.0.0"]
                .iter()
                .map(|v| Version::parse(v).unwrap()),
        )
    }

    #[test]
    fn test_normalize_bare_equals() {
        assert_eq!(normalize_root_range("=14"), "= 14");
        assert_eq!(normalize_root_range("=14 || =16"), "= 14 || = 16");
        assert_eq!(normalize_root_range(">=14"), ">=14");
        assert_eq!(normalize_root_range("<=14"), "<=14");
        assert_eq!(normalize_root_range("= 14"), "= 14");
    }

    #[test]
    fn test_equality_forms_resolve_identically() {
        let catalog = catalog();
        let bare = resolve_root(Some(&declared("=14")), &catalog);
        let spaced = resolve_root(Some(&declared("= 14")), &catalog);
        assert_eq!(bare.valid, spaced.valid);
        assert_eq!(bare.valid, vec![Version::new(14, 5, 0), Version::new(14, 0, 0)]);
    }

    #[test]
    fn test_absent_is_whole_catalog() {
        let catalog = catalog();
        let resolution = resolve_root(None, &catalog);
        assert_eq!(resolution.valid.len(), 4);
        assert!(!resolution.constrained);
        assert!(resolution.declared.is_none());
    }

    #[test]
    fn test_wildcard_is_unconstrained() {
        let resolution = resolve_root(Some(&declared("*")), &catalog());
        assert!(!resolution.constrained);
        assert_eq!(resolution.valid.len(), 4);
        assert_eq!(resolution.declared.as_deref(), Some("*"));
    }

    #[test]
    fn test_declared_range_filters_descending() {
        let resolution = resolve_root(Some(&declared(">= 14")), &catalog());
        assert!(resolution.constrained);
        assert_eq!(
            resolution.valid,
            vec![
                Version::new(16, 0, 0),
                Version::new(14, 5, 0),
                Version::new(14, 0, 0)
            ]
        );
    }

    #[test]
    fn test_malformed_root_fails_open() {
        let resolution = resolve_root(Some(&declared("not a range")), &catalog());
        assert!(resolution.invalid.is_some());
        assert!(!resolution.constrained);
        assert_eq!(resolution.valid.len(), 4);
    }

    #[test]
    fn test_other_engine_is_ignored() {
        let other = Constraint::root("npm", ">= 9");
        let resolution = resolve_root(Some(&other), &catalog());
        assert!(!resolution.constrained);
        assert!(resolution.declared.is_none());
    }
}
