//! Constraint resolution and range synthesis
//!
//! Pipeline for one engine:
//! - `extractor` turns the inventory into constraints
//! - `graph` intersects every package constraint over the catalog
//! - `root` resolves the project's own declaration independently
//! - `synthesizer` turns each version set back into a range, checked by `consistency`
//! - `reconcile` compares root and graph

mod consistency;
mod extractor;
mod filter;
mod graph;
mod reconcile;
mod root;
mod synthesizer;

pub use consistency::{denotes, verify};
pub use extractor::extract_constraints;
pub use filter::filter_versions;
pub use graph::{resolve_graph, GraphResolution, InvalidConstraint, PackageReport};
pub use reconcile::{latest_per_major, reconcile, Bottleneck, MajorRelease, Reconciliation, Verdict};
pub use root::{normalize_root_range, resolve_root, RootResolution};
pub use synthesizer::{synthesize, SynthesizedRange};

use crate::catalog::VersionCatalog;
use crate::domain::{Constraint, EngineName};
use crate::error::SynthesisError;

/// Everything computed for one engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResolution {
    pub engine: EngineName,
    pub root: RootResolution,
    /// Synthesized form of the root's valid set
    pub root_range: SynthesizedRange,
    pub graph: GraphResolution,
    /// Synthesized form of the graph's valid set
    pub graph_range: SynthesizedRange,
    pub reconciliation: Reconciliation,
    /// Newest graph-valid release of each major line
    pub latest_per_major: Vec<MajorRelease>,
}

impl EngineResolution {
    pub fn verdict(&self) -> &Verdict {
        &self.reconciliation.verdict
    }
}

/// Resolves the root declaration and the graph constraints for the catalog's engine
///
/// Constraints for other engines are ignored, so the full constraint list
/// can be passed for every engine.
pub fn resolve_engine(
    catalog: &VersionCatalog,
    root_declared: Option<&str>,
    constraints: &[Constraint],
) -> Result<EngineResolution, SynthesisError> {
    let engine = catalog.engine().clone();

    let root_constraint = root_declared.map(|range| Constraint::root(engine.clone(), range));
    let root = resolve_root(root_constraint.as_ref(), catalog);
    let graph = resolve_graph(constraints, catalog);

    let root_range = synthesize(&engine, &root.valid, catalog, root.constrained)?;
    let graph_range = synthesize(&engine, &graph.valid, catalog, graph.is_constrained())?;

    let reconciliation = reconcile(&root, &graph, catalog)?;
    let latest_per_major = latest_per_major(&graph.valid, catalog);

    tracing::info!(
        %engine,
        root = %root_range,
        graph = %graph_range,
        verdict = reconciliation.verdict.kind(),
        "resolved engine"
    );

    Ok(EngineResolution {
        engine,
        root,
        root_range,
        graph,
        graph_range,
        reconciliation,
        latest_per_major,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PackageRecord;
    use semver::Version;

    fn catalog() -> VersionCatalog {
        let mut versions = Vec::new();
        for major in [12u64, 14, 16, 18, 20] {
            for minor in [0u64, 5, 10] {
                versions.push(Version::new(major, minor, 0));
            }
        }
        VersionCatalog::from_versions(EngineName::node(), versions)
    }

    #[test]
    fn test_no_declarations_fail_open() {
        let records = vec![
            PackageRecord::new("a", "node_modules/a"),
            PackageRecord::new("b", "node_modules/b").with_engine("node", "*"),
            PackageRecord::new("c", "node_modules/c")
                .with_engine("node", ">= 20")
                .bundled(true),
        ];
        let constraints = extract_constraints(&records, &[EngineName::node()]);
        let catalog = catalog();
        let resolution = resolve_engine(&catalog, None, &constraints).unwrap();

        assert_eq!(resolution.graph.valid.len(), catalog.len());
        assert_eq!(resolution.graph_range.display(), Some("*"));
        assert!(resolution.verdict().is_compatible());
    }

    #[test]
    fn test_full_pipeline() {
        let records = vec![
            PackageRecord::new("a", "node_modules/a").with_engine("node", ">= 14.5"),
            PackageRecord::new("b", "node_modules/b").with_engine("node", "^14.10 || ^16 || >= 18"),
        ];
        let constraints = extract_constraints(&records, &[EngineName::node()]);
        let catalog = catalog();
        let resolution = resolve_engine(&catalog, Some(">=12"), &constraints).unwrap();

        assert_eq!(resolution.root_range.display(), Some(">= 12"));
        assert_eq!(resolution.graph_range.display(), Some(">= 14.10"));
        assert_eq!(
            resolution.verdict().suggested().and_then(|s| s.display()),
            Some(">= 14.10")
        );
        let lines: Vec<&str> = resolution
            .latest_per_major
            .iter()
            .map(|m| m.line.as_str())
            .collect();
        assert_eq!(lines, vec!["20", "18", "16", "14"]);
    }

    #[test]
    fn test_disjoint_graph_synthesizes_union() {
        let constraints = vec![Constraint::package("a", "node", "^14 || ^18")];
        let resolution = resolve_engine(&catalog(), Some("^14 || ^18"), &constraints).unwrap();
        assert_eq!(resolution.graph_range.display(), Some("^18 || ^14"));
        assert!(resolution.verdict().is_compatible());
    }

    #[test]
    fn test_unsatisfiable_graph() {
        let constraints = vec![
            Constraint::package("a", "node", "^12"),
            Constraint::package("b", "node", ">= 20"),
        ];
        let resolution = resolve_engine(&catalog(), None, &constraints).unwrap();
        assert!(resolution.graph_range.is_unsatisfiable());
        assert_eq!(resolution.verdict(), &Verdict::GraphUnsatisfiable);
        assert!(resolution.latest_per_major.is_empty());
    }

    fn patch_catalog() -> VersionCatalog {
        VersionCatalog::from_versions(
            EngineName::node(),
            ["18.16.0", "18.17.0", "18.17.1", "18.18.0", "20.0.0"]
                .iter()
                .map(|v| Version::parse(v).unwrap()),
        )
    }

    #[test]
    fn test_pinned_root() {
        let resolution = resolve_engine(&patch_catalog(), Some("18.17.1"), &[]).unwrap();
        assert_eq!(resolution.root.valid, vec![Version::new(18, 17, 1)]);
        assert_eq!(resolution.root_range.display(), Some("18.17.1"));
        assert!(resolution.verdict().is_compatible());
    }

    #[test]
    fn test_bounded_package_range() {
        let constraints = vec![Constraint::package("a", "node", ">=18.17 <18.18")];
        let resolution = resolve_engine(&patch_catalog(), Some(">= 18"), &constraints).unwrap();

        assert_eq!(resolution.graph_range.display(), Some(">= 18.17 < 18.18"));
        assert_eq!(
            resolution.verdict().suggested().and_then(|s| s.display()),
            Some(">= 18.17 < 18.18")
        );
    }

    #[test]
    fn test_root_matching_no_release() {
        let constraints = vec![Constraint::package("a", "node", ">= 14")];
        let resolution = resolve_engine(&catalog(), Some(">= 99"), &constraints).unwrap();
        assert!(resolution.root_range.is_unsatisfiable());
        assert_eq!(resolution.verdict(), &Verdict::NoOverlap);
    }
}
