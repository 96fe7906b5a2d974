//! Local catalog file source
//!
//! Accepts either a plain JSON array of version strings
//! (`["v18.0.0", "18.1.0"]`) or a saved copy of the nodejs.org dist index.

use super::node_dist::{entries_from_releases, DistRelease};
use crate::catalog::{CatalogEntry, CatalogSource, VersionCatalog};
use crate::domain::EngineName;
use crate::error::CatalogError;
use crate::range::normalize_version;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Catalog read from a local JSON file
pub struct FileCatalogSource {
    engine: EngineName,
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Plain(Vec<String>),
    Dist(Vec<DistRelease>),
}

impl FileCatalogSource {
    pub fn new(engine: EngineName, path: impl AsRef<Path>) -> Self {
        Self {
            engine,
            path: path.as_ref().to_path_buf(),
        }
    }

    fn parse(&self, content: &str) -> Result<VersionCatalog, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content).map_err(|e| {
            CatalogError::invalid_response(self.engine.as_str(), self.source_name(), e.to_string())
        })?;

        let entries = match file {
            CatalogFile::Plain(versions) => versions
                .iter()
                .filter_map(|v| normalize_version(v).ok())
                .map(CatalogEntry::new)
                .collect(),
            CatalogFile::Dist(releases) => entries_from_releases(releases),
        };

        let catalog = VersionCatalog::new(self.engine.clone(), entries);
        if catalog.is_empty() {
            return Err(CatalogError::Empty {
                engine: self.engine.to_string(),
                source_name: self.source_name(),
            });
        }
        Ok(catalog)
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    fn engine(&self) -> &EngineName {
        &self.engine
    }

    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<VersionCatalog, CatalogError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogError::ReadError {
                path: self.path.clone(),
                source,
            })?;
        self.parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_plain_array() {
        let source = FileCatalogSource::new(EngineName::node(), "versions.json");
        let catalog = source
            .parse(r#"["v18.1.0", "18.0.0", "garbage", "16.20.2"]"#)
            .unwrap();
        let versions: Vec<&Version> = catalog.versions().collect();
        assert_eq!(versions.len(), 3);
        assert_eq!(versions[0], &Version::new(16, 20, 2));
        assert_eq!(versions[2], &Version::new(18, 1, 0));
    }

    #[test]
    fn test_parse_dist_format() {
        let source = FileCatalogSource::new(EngineName::node(), "index.json");
        let catalog = source
            .parse(r#"[{"version": "v20.0.0", "date": "2023-04-18", "lts": false}]"#)
            .unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.entries()[0].date.is_some());
    }

    #[test]
    fn test_parse_empty_is_error() {
        let source = FileCatalogSource::new(EngineName::node(), "versions.json");
        let result = source.parse("[]");
        assert!(matches!(result, Err(CatalogError::Empty { .. })));
    }

    #[test]
    fn test_parse_invalid_json() {
        let source = FileCatalogSource::new(EngineName::node(), "versions.json");
        let result = source.parse("{ not json");
        assert!(matches!(result, Err(CatalogError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn test_fetch_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("versions.json");
        fs::write(&path, r#"["14.0.0", "16.0.0"]"#).unwrap();

        let source = FileCatalogSource::new(EngineName::node(), &path);
        let catalog = source.fetch().await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.engine(), &EngineName::node());
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let source = FileCatalogSource::new(EngineName::node(), "/nonexistent/versions.json");
        let result = source.fetch().await;
        assert!(matches!(result, Err(CatalogError::ReadError { .. })));
    }
}
