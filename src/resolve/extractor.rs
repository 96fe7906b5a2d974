//! Constraint extraction from a dependency inventory

use crate::domain::{Constraint, EngineName, PackageRecord};
use crate::range::is_wildcard;
use std::collections::HashSet;

/// Collects the engine constraints the inventory imposes on the selected engines
///
/// Bundled packages and wildcard declarations impose nothing. Duplicate
/// installs of the same package with the same declaration collapse into one
/// constraint; the first occurrence keeps its position.
pub fn extract_constraints(records: &[PackageRecord], engines: &[EngineName]) -> Vec<Constraint> {
    let mut seen = HashSet::new();
    let mut constraints = Vec::new();

    for record in records {
        if record.bundled {
            tracing::trace!(package = %record, "skipping bundled package");
            continue;
        }

        for engine in engines {
            let Some(range) = record.engine_range(engine) else {
                continue;
            };
            if is_wildcard(range) {
                continue;
            }

            let constraint = Constraint::package(&record.name, engine.clone(), range.trim());
            if seen.insert(constraint.clone()) {
                constraints.push(constraint);
            }
        }
    }

    constraints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConstraintSource;

    fn node() -> Vec<EngineName> {
        vec![EngineName::node()]
    }

    #[test]
    fn test_extracts_declared_ranges() {
        let records = vec![
            PackageRecord::new("a", "node_modules/a").with_engine("node", ">= 14"),
            PackageRecord::new("b", "node_modules/b").with_engine("node", "^16 || ^18"),
        ];
        let constraints = extract_constraints(&records, &node());
        assert_eq!(constraints.len(), 2);
        assert_eq!(
            constraints[0].source,
            ConstraintSource::Package("a".to_string())
        );
        assert_eq!(constraints[1].range, "^16 || ^18");
    }

    #[test]
    fn test_bundled_packages_are_dropped() {
        let records = vec![PackageRecord::new("inner", "node_modules/outer/node_modules/inner")
            .with_engine("node", ">= 20")
            .bundled(true)];
        assert!(extract_constraints(&records, &node()).is_empty());
    }

    #[test]
    fn test_wildcards_are_dropped() {
        let records = vec![
            PackageRecord::new("star", "node_modules/star").with_engine("node", "*"),
            PackageRecord::new("x", "node_modules/x").with_engine("node", "x"),
            PackageRecord::new("blank", "node_modules/blank").with_engine("node", "  "),
        ];
        assert!(extract_constraints(&records, &node()).is_empty());
    }

    #[test]
    fn test_unselected_engines_are_ignored() {
        let records = vec![PackageRecord::new("a", "node_modules/a")
            .with_engine("npm", ">= 7")
            .with_engine("node", ">= 12")];
        let constraints = extract_constraints(&records, &node());
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].engine, EngineName::node());
    }

    #[test]
    fn test_multiple_selected_engines() {
        let records = vec![PackageRecord::new("a", "node_modules/a")
            .with_engine("npm", ">= 7")
            .with_engine("node", ">= 12")];
        let engines = vec![EngineName::node(), EngineName::new("npm")];
        assert_eq!(extract_constraints(&records, &engines).len(), 2);
    }

    #[test]
    fn test_duplicate_installs_collapse() {
        let records = vec![
            PackageRecord::new("a", "node_modules/a").with_engine("node", ">= 14"),
            PackageRecord::new("a", "node_modules/b/node_modules/a").with_engine("node", ">= 14"),
            PackageRecord::new("a", "node_modules/c/node_modules/a").with_engine("node", ">= 16"),
        ];
        let constraints = extract_constraints(&records, &node());
        assert_eq!(constraints.len(), 2);
    }

    #[test]
    fn test_packages_without_engines_contribute_nothing() {
        let records = vec![PackageRecord::new("plain", "node_modules/plain")];
        assert!(extract_constraints(&records, &node()).is_empty());
    }
}
