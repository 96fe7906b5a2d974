//! Installed (actual tree) reader
//!
//! Walks `node_modules` recursively, including `@scope/` directories, and
//! computes which packages are reachable only through dev dependencies.

use crate::domain::PackageRecord;
use crate::error::InventoryError;
use crate::manifest::{parse_engines, PACKAGE_JSON};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding installed packages
pub const NODE_MODULES: &str = "node_modules";

/// The fields of an installed package.json the walk needs
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstalledManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    engines: Option<Value>,
    #[serde(default)]
    dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    bundle_dependencies: Option<Value>,
    #[serde(default)]
    bundled_dependencies: Option<Value>,
    #[serde(default, rename = "_inBundle")]
    in_bundle: bool,
}

impl InstalledManifest {
    /// Names of the dependencies installed for production use
    fn production_dependencies(&self) -> impl Iterator<Item = &String> {
        self.dependencies
            .keys()
            .chain(self.optional_dependencies.keys())
            .chain(self.peer_dependencies.keys())
    }

    /// Names listed in `bundleDependencies` (or `true` for all dependencies)
    fn bundled_names(&self) -> HashSet<String> {
        match self
            .bundle_dependencies
            .as_ref()
            .or(self.bundled_dependencies.as_ref())
        {
            Some(Value::Bool(true)) => self.dependencies.keys().cloned().collect(),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect(),
            _ => HashSet::new(),
        }
    }
}

/// A package found during the walk
struct Installed {
    dir: PathBuf,
    record: PackageRecord,
    dependencies: Vec<String>,
}

/// Reads every installed package under `root/node_modules`
pub fn read_node_modules(root: &Path) -> Result<Vec<PackageRecord>, InventoryError> {
    let root_manifest = read_installed_manifest(&root.join(PACKAGE_JSON))?.ok_or_else(|| {
        InventoryError::Missing {
            what: PACKAGE_JSON,
            path: root.to_path_buf(),
        }
    })?;

    let mut walker = Walker {
        root,
        visited: HashSet::new(),
        installed: Vec::new(),
    };
    walker.walk(&root.join(NODE_MODULES), &root_manifest.bundled_names(), false)?;
    let mut installed = walker.installed;

    let production = reachable(root, &root_manifest, &installed);
    for (index, package) in installed.iter_mut().enumerate() {
        package.record.dev = !production.contains(&index);
    }

    tracing::debug!(
        root = %root.display(),
        count = installed.len(),
        "read node_modules"
    );
    Ok(installed.into_iter().map(|p| p.record).collect())
}

struct Walker<'a> {
    root: &'a Path,
    visited: HashSet<PathBuf>,
    installed: Vec<Installed>,
}

impl Walker<'_> {
    fn walk(
        &mut self,
        modules: &Path,
        parent_bundle: &HashSet<String>,
        parent_bundled: bool,
    ) -> Result<(), InventoryError> {
        if !modules.is_dir() {
            return Ok(());
        }

        for dir in package_dirs(modules)? {
            let canonical = fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
            if !self.visited.insert(canonical) {
                continue;
            }

            let Some(manifest) = read_installed_manifest(&dir.join(PACKAGE_JSON))? else {
                tracing::debug!(dir = %dir.display(), "no package.json, skipping");
                continue;
            };

            let dir_name = dir
                .strip_prefix(modules)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            let name = manifest.name.clone().unwrap_or(dir_name.clone());
            let bundled = parent_bundled || manifest.in_bundle || parent_bundle.contains(&dir_name);

            let relative = dir.strip_prefix(self.root).unwrap_or(&dir).to_path_buf();
            let mut record = PackageRecord::new(name, relative).bundled(bundled);
            if let Some(version) = &manifest.version {
                record = record.with_version(version.as_str());
            }
            record.engines = manifest
                .engines
                .as_ref()
                .map(parse_engines)
                .unwrap_or_default();

            self.installed.push(Installed {
                dir: dir.clone(),
                record,
                dependencies: manifest.production_dependencies().cloned().collect(),
            });

            self.walk(&dir.join(NODE_MODULES), &manifest.bundled_names(), bundled)?;
        }

        Ok(())
    }
}

/// Package directories in one `node_modules`, expanding `@scope` directories
fn package_dirs(modules: &Path) -> Result<Vec<PathBuf>, InventoryError> {
    let mut dirs = Vec::new();
    for entry in sorted_entries(modules)? {
        let name = entry.file_name().map(|n| n.to_string_lossy().into_owned());
        match name.as_deref() {
            Some(n) if n.starts_with('.') => continue,
            Some(n) if n.starts_with('@') => {
                dirs.extend(
                    sorted_entries(&entry)?
                        .into_iter()
                        .filter(|p| !p.file_name().is_some_and(|n| n.to_string_lossy().starts_with('.'))),
                );
            }
            Some(_) => dirs.push(entry),
            None => {}
        }
    }
    Ok(dirs)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, InventoryError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| InventoryError::read_error(dir, e))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    entries.sort();
    Ok(entries)
}

/// Reads a package.json; Ok(None) when it does not exist
fn read_installed_manifest(path: &Path) -> Result<Option<InstalledManifest>, InventoryError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| InventoryError::read_error(path, e))?;
    match serde_json::from_str(&content) {
        Ok(manifest) => Ok(Some(manifest)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unparsable package.json");
            Ok(Some(InstalledManifest::default()))
        }
    }
}

/// Indices of packages reachable from the root's production dependencies
///
/// Dependencies resolve like `require()`: the nearest `node_modules/<name>`
/// walking up from the requiring package towards the project root.
fn reachable(root: &Path, root_manifest: &InstalledManifest, installed: &[Installed]) -> HashSet<usize> {
    let by_dir: HashMap<&Path, usize> = installed
        .iter()
        .enumerate()
        .map(|(index, package)| (package.dir.as_path(), index))
        .collect();

    let mut production = HashSet::new();
    let mut queue: VecDeque<(PathBuf, String)> = root_manifest
        .production_dependencies()
        .map(|name| (root.to_path_buf(), name.clone()))
        .collect();

    while let Some((from, name)) = queue.pop_front() {
        let Some(index) = resolve(root, &from, &name, &by_dir) else {
            tracing::trace!(%name, from = %from.display(), "dependency not installed");
            continue;
        };
        if production.insert(index) {
            let package = &installed[index];
            queue.extend(
                package
                    .dependencies
                    .iter()
                    .map(|dep| (package.dir.clone(), dep.clone())),
            );
        }
    }

    production
}

fn resolve(root: &Path, from: &Path, name: &str, by_dir: &HashMap<&Path, usize>) -> Option<usize> {
    for dir in from.ancestors() {
        if dir.file_name().is_some_and(|n| n == NODE_MODULES) {
            continue;
        }
        if let Some(index) = by_dir.get(dir.join(NODE_MODULES).join(name).as_path()) {
            return Some(*index);
        }
        if dir == root {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EngineName;
    use tempfile::TempDir;

    fn write_package(dir: &Path, json: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(PACKAGE_JSON), json).unwrap();
    }

    /// root -> a -> b (nested), root -> @scope/s, dev-only d, bundled c inside a
    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_package(
            root,
            r#"{ "name": "app", "dependencies": { "a": "^1", "@scope/s": "^1" }, "devDependencies": { "d": "^1" } }"#,
        );
        let modules = root.join(NODE_MODULES);
        write_package(
            &modules.join("a"),
            r#"{ "name": "a", "version": "1.0.0", "engines": { "node": ">= 14" },
                 "dependencies": { "b": "^2", "c": "^1" }, "bundleDependencies": ["c"] }"#,
        );
        write_package(
            &modules.join("a").join(NODE_MODULES).join("b"),
            r#"{ "name": "b", "version": "2.0.0", "engines": { "node": "^16 || >= 18" } }"#,
        );
        write_package(
            &modules.join("a").join(NODE_MODULES).join("c"),
            r#"{ "name": "c", "version": "1.0.0", "engines": { "node": ">= 20" } }"#,
        );
        write_package(
            &modules.join("@scope").join("s"),
            r#"{ "name": "@scope/s", "version": "1.2.0", "engines": { "node": ">= 12" } }"#,
        );
        write_package(
            &modules.join("d"),
            r#"{ "name": "d", "version": "1.0.0", "engines": { "node": ">= 22" } }"#,
        );
        fs::create_dir_all(modules.join(".bin")).unwrap();
        tmp
    }

    fn find<'a>(records: &'a [PackageRecord], name: &str) -> &'a PackageRecord {
        records
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("missing {}", name))
    }

    #[test]
    fn test_walk_finds_nested_and_scoped() {
        let tmp = fixture();
        let records = read_node_modules(tmp.path()).unwrap();
        assert_eq!(records.len(), 5);

        let b = find(&records, "b");
        assert_eq!(b.path, PathBuf::from("node_modules/a/node_modules/b"));
        assert_eq!(b.engine_range(&EngineName::node()), Some("^16 || >= 18"));

        let s = find(&records, "@scope/s");
        assert_eq!(s.version.as_deref(), Some("1.2.0"));
    }

    #[test]
    fn test_bundled_detection() {
        let tmp = fixture();
        let records = read_node_modules(tmp.path()).unwrap();
        assert!(find(&records, "c").bundled);
        assert!(!find(&records, "b").bundled);
        assert!(!find(&records, "a").bundled);
    }

    #[test]
    fn test_in_bundle_marker() {
        let tmp = fixture();
        write_package(
            &tmp.path().join(NODE_MODULES).join("e"),
            r#"{ "name": "e", "_inBundle": true }"#,
        );
        let records = read_node_modules(tmp.path()).unwrap();
        assert!(find(&records, "e").bundled);
    }

    #[test]
    fn test_dev_reachability() {
        let tmp = fixture();
        let records = read_node_modules(tmp.path()).unwrap();
        assert!(find(&records, "d").dev);
        assert!(!find(&records, "a").dev);
        assert!(!find(&records, "b").dev);
        assert!(!find(&records, "@scope/s").dev);
    }

    #[test]
    fn test_hoisted_dependency_resolves_upward() {
        let tmp = fixture();
        // d is now also required by b and found by walking up from a/node_modules/b
        write_package(
            &tmp.path().join(NODE_MODULES).join("a").join(NODE_MODULES).join("b"),
            r#"{ "name": "b", "version": "2.0.0", "dependencies": { "d": "^1" } }"#,
        );
        let records = read_node_modules(tmp.path()).unwrap();
        assert!(!find(&records, "d").dev);
    }

    #[test]
    fn test_missing_root_manifest() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(NODE_MODULES)).unwrap();
        let result = read_node_modules(tmp.path());
        assert!(matches!(result, Err(InventoryError::Missing { .. })));
    }

    #[test]
    fn test_bundle_all_dependencies() {
        let manifest: InstalledManifest =
            serde_json::from_str(r#"{ "dependencies": { "x": "1", "y": "2" }, "bundledDependencies": true }"#)
                .unwrap();
        let names = manifest.bundled_names();
        assert!(names.contains("x"));
        assert!(names.contains("y"));
    }
}
