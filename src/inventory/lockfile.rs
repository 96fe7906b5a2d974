//! Lockfile (virtual tree) reader
//!
//! Reads the `packages` map of `package-lock.json` / `npm-shrinkwrap.json`,
//! present from lockfileVersion 2 onward.

use crate::domain::PackageRecord;
use crate::error::InventoryError;
use crate::manifest::parse_engines;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Lockfile names in lookup order
pub const LOCKFILES: [&str; 2] = ["npm-shrinkwrap.json", "package-lock.json"];

const NODE_MODULES_SEGMENT: &str = "node_modules/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Lockfile {
    #[serde(default)]
    lockfile_version: Option<u64>,
    #[serde(default)]
    packages: Option<BTreeMap<String, LockEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    engines: Option<Value>,
    #[serde(default)]
    in_bundle: bool,
    #[serde(default)]
    dev: bool,
    #[serde(default)]
    link: bool,
}

/// Finds the lockfile in a project directory
pub fn find_lockfile(root: &Path) -> Option<std::path::PathBuf> {
    LOCKFILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Reads package records from a lockfile
pub fn read_lockfile(path: &Path) -> Result<Vec<PackageRecord>, InventoryError> {
    let content = std::fs::read_to_string(path).map_err(|e| InventoryError::read_error(path, e))?;
    parse_lockfile(path, &content)
}

/// Parses lockfile content into package records
///
/// The root entry (`""`) and workspace links are skipped; the link target
/// has its own entry.
pub fn parse_lockfile(path: &Path, content: &str) -> Result<Vec<PackageRecord>, InventoryError> {
    let lockfile: Lockfile = serde_json::from_str(content)
        .map_err(|e| InventoryError::json_parse_error(path, e.to_string()))?;

    let version = lockfile.lockfile_version.unwrap_or(1);
    let packages = match lockfile.packages {
        Some(packages) if version >= 2 => packages,
        _ => {
            return Err(InventoryError::UnsupportedLockfile {
                path: path.to_path_buf(),
                version,
            })
        }
    };

    let records: Vec<PackageRecord> = packages
        .into_iter()
        .filter(|(location, entry)| !location.is_empty() && !entry.link)
        .map(|(location, entry)| {
            let name = entry
                .name
                .clone()
                .or_else(|| package_name(&location).map(str::to_string))
                .unwrap_or_else(|| location.clone());

            let mut record = PackageRecord::new(name, &location)
                .bundled(entry.in_bundle)
                .dev(entry.dev);
            if let Some(version) = entry.version {
                record = record.with_version(version);
            }
            record.engines = entry
                .engines
                .as_ref()
                .map(parse_engines)
                .unwrap_or_default();
            record
        })
        .collect();

    tracing::debug!(
        path = %path.display(),
        lockfile_version = version,
        count = records.len(),
        "read lockfile"
    );
    Ok(records)
}

/// Package name from a location such as `node_modules/a/node_modules/@s/b`
fn package_name(location: &str) -> Option<&str> {
    location
        .rfind(NODE_MODULES_SEGMENT)
        .map(|index| &location[index + NODE_MODULES_SEGMENT.len()..])
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EngineName;
    use std::fs;
    use tempfile::TempDir;

    const LOCKFILE: &str = r#"{
  "name": "app",
  "lockfileVersion": 3,
  "packages": {
    "": { "name": "app", "engines": { "node": ">= 12" } },
    "node_modules/a": { "version": "1.0.0", "engines": { "node": ">= 14" } },
    "node_modules/a/node_modules/@scope/b": { "version": "2.0.0", "engines": { "node": "^16" } },
    "node_modules/c": { "version": "1.0.0", "engines": { "node": ">= 20" }, "inBundle": true },
    "node_modules/d": { "version": "3.0.0", "dev": true, "engines": { "node": ">= 18" } },
    "node_modules/old": { "version": "0.1.0", "engines": ["node >= 0.8"] },
    "node_modules/ws": { "resolved": "packages/ws", "link": true },
    "packages/ws": { "name": "ws", "version": "0.0.1" }
  }
}"#;

    fn parse(content: &str) -> Result<Vec<PackageRecord>, InventoryError> {
        parse_lockfile(Path::new("package-lock.json"), content)
    }

    fn find<'a>(records: &'a [PackageRecord], name: &str) -> &'a PackageRecord {
        records.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_parse_records() {
        let records = parse(LOCKFILE).unwrap();
        assert_eq!(records.len(), 6);

        let a = find(&records, "a");
        assert_eq!(a.version.as_deref(), Some("1.0.0"));
        assert_eq!(a.engine_range(&EngineName::node()), Some(">= 14"));
        assert!(!a.bundled);
        assert!(!a.dev);
    }

    #[test]
    fn test_scoped_nested_name() {
        let records = parse(LOCKFILE).unwrap();
        let b = find(&records, "@scope/b");
        assert_eq!(
            b.path,
            std::path::PathBuf::from("node_modules/a/node_modules/@scope/b")
        );
    }

    #[test]
    fn test_bundled_and_dev_flags() {
        let records = parse(LOCKFILE).unwrap();
        assert!(find(&records, "c").bundled);
        assert!(find(&records, "d").dev);
    }

    #[test]
    fn test_array_engines_ignored() {
        let records = parse(LOCKFILE).unwrap();
        assert!(find(&records, "old").engines.is_empty());
    }

    #[test]
    fn test_links_and_root_skipped() {
        let records = parse(LOCKFILE).unwrap();
        assert!(records.iter().all(|r| r.name != "app"));
        assert_eq!(records.iter().filter(|r| r.name == "ws").count(), 1);
    }

    #[test]
    fn test_v1_rejected() {
        let result = parse(r#"{ "lockfileVersion": 1, "dependencies": {} }"#);
        assert!(matches!(
            result,
            Err(InventoryError::UnsupportedLockfile { version: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_json() {
        let result = parse("{ nope");
        assert!(matches!(result, Err(InventoryError::JsonParseError { .. })));
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("node_modules/a"), Some("a"));
        assert_eq!(package_name("node_modules/a/node_modules/@s/b"), Some("@s/b"));
        assert_eq!(package_name("packages/ws"), None);
    }

    #[test]
    fn test_find_lockfile_prefers_shrinkwrap() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package-lock.json"), "{}").unwrap();
        assert_eq!(
            find_lockfile(dir.path()),
            Some(dir.path().join("package-lock.json"))
        );

        fs::write(dir.path().join("npm-shrinkwrap.json"), "{}").unwrap();
        assert_eq!(
            find_lockfile(dir.path()),
            Some(dir.path().join("npm-shrinkwrap.json"))
        );
    }

    #[test]
    fn test_find_lockfile_none() {
        let dir = TempDir::new().unwrap();
        assert!(find_lockfile(dir.path()).is_none());
    }
}
