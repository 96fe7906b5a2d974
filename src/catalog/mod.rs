//! Engine version catalogs
//!
//! This module provides:
//! - The immutable, ascending list of released versions for one engine
//! - HTTP client shared foundation with retry logic
//! - nodejs.org dist index source
//! - Local JSON file source for offline use

mod client;
mod file;
mod node_dist;

pub use client::HttpClient;
pub use file::FileCatalogSource;
pub use node_dist::{NodeDistSource, NODE_DIST_URL};

use crate::domain::EngineName;
use crate::error::{CatalogError, ConfigError};
use async_trait::async_trait;
use chrono::NaiveDate;
use semver::Version;
use serde::Serialize;
use std::path::PathBuf;

/// A released engine version with optional release metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// The version
    pub version: Version,
    /// Release date, when the source provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// LTS codename, when the release line is LTS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lts: Option<String>,
}

impl CatalogEntry {
    /// Creates an entry without metadata
    pub fn new(version: Version) -> Self {
        Self {
            version,
            date: None,
            lts: None,
        }
    }
}

/// Every released version of one engine, ascending and de-duplicated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCatalog {
    engine: EngineName,
    entries: Vec<CatalogEntry>,
}

impl VersionCatalog {
    /// Builds a catalog from entries in any order
    pub fn new(engine: EngineName, mut entries: Vec<CatalogEntry>) -> Self {
        entries.sort_by(|a, b| a.version.cmp(&b.version));
        entries.dedup_by(|a, b| a.version == b.version);
        Self { engine, entries }
    }

    /// Builds a catalog from bare versions
    pub fn from_versions(engine: EngineName, versions: impl IntoIterator<Item = Version>) -> Self {
        Self::new(engine, versions.into_iter().map(CatalogEntry::new).collect())
    }

    /// The engine this catalog describes
    pub fn engine(&self) -> &EngineName {
        &self.engine
    }

    /// All entries, ascending
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// All versions, ascending
    pub fn versions(&self) -> impl DoubleEndedIterator<Item = &Version> + '_ {
        self.entries.iter().map(|e| &e.version)
    }

    /// Looks up the entry for a version
    pub fn entry(&self, version: &Version) -> Option<&CatalogEntry> {
        self.entries
            .binary_search_by(|e| e.version.cmp(version))
            .ok()
            .map(|index| &self.entries[index])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trait for catalog sources
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// The engine this source describes
    fn engine(&self) -> &EngineName;

    /// A short name for messages (host name or file path)
    fn source_name(&self) -> String;

    /// Fetch every released version
    async fn fetch(&self) -> Result<VersionCatalog, CatalogError>;
}

/// Create a catalog source for an engine
///
/// A local file takes precedence; otherwise only `node` has a network source.
pub fn create_source(
    engine: &EngineName,
    file: Option<&PathBuf>,
    dist_url: Option<&str>,
    client: HttpClient,
) -> Result<Box<dyn CatalogSource>, ConfigError> {
    if let Some(path) = file {
        return Ok(Box::new(FileCatalogSource::new(engine.clone(), path)));
    }
    if engine.is_node() {
        let source = match dist_url {
            Some(url) => NodeDistSource::with_url(client, url),
            None => NodeDistSource::new(client),
        };
        return Ok(Box::new(source));
    }
    Err(ConfigError::UnsupportedEngine {
        engine: engine.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_catalog_sorts_and_dedups() {
        let catalog = VersionCatalog::from_versions(
            EngineName::node(),
            vec![v("2.0.0"), v("1.0.0"), v("2.0.0"), v("1.5.0")],
        );
        let versions: Vec<String> = catalog.versions().map(|v| v.to_string()).collect();
        assert_eq!(versions, vec!["1.0.0", "1.5.0", "2.0.0"]);
        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_catalog_entry_lookup() {
        let mut entry = CatalogEntry::new(v("20.11.0"));
        entry.lts = Some("Iron".to_string());
        let catalog = VersionCatalog::new(EngineName::node(), vec![entry]);

        let found = catalog.entry(&v("20.11.0")).unwrap();
        assert_eq!(found.lts.as_deref(), Some("Iron"));
        assert!(catalog.entry(&v("20.12.0")).is_none());
    }

    #[test]
    fn test_create_source_node() {
        let client = HttpClient::new().unwrap();
        let source = create_source(&EngineName::node(), None, None, client).unwrap();
        assert_eq!(source.engine(), &EngineName::node());
        assert_eq!(source.source_name(), "nodejs.org");
    }

    #[test]
    fn test_create_source_file_takes_precedence() {
        let client = HttpClient::new().unwrap();
        let path = PathBuf::from("versions.json");
        let source = create_source(&EngineName::new("deno"), Some(&path), None, client).unwrap();
        assert_eq!(source.engine(), &EngineName::new("deno"));
        assert!(source.source_name().contains("versions.json"));
    }

    #[test]
    fn test_create_source_unknown_engine() {
        let client = HttpClient::new().unwrap();
        let result = create_source(&EngineName::new("deno"), None, None, client);
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedEngine { .. })
        ));
    }
}
