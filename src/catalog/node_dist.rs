//! nodejs.org dist index source
//!
//! Fetches every released Node.js version.
//! API endpoint: https://nodejs.org/dist/index.json

use crate::catalog::{CatalogEntry, CatalogSource, HttpClient, VersionCatalog};
use crate::domain::EngineName;
use crate::error::CatalogError;
use crate::range::normalize_version;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

/// nodejs.org dist base URL
pub const NODE_DIST_URL: &str = "https://nodejs.org/dist";

/// nodejs.org dist index source
pub struct NodeDistSource {
    client: HttpClient,
    engine: EngineName,
    base_url: String,
}

/// One release in the dist index
#[derive(Debug, Deserialize)]
pub(super) struct DistRelease {
    /// Version with leading `v`, e.g. `v20.11.0`
    pub version: String,
    /// Release date, `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
    /// `false`, or the LTS codename
    #[serde(default)]
    pub lts: serde_json::Value,
}

/// Converts dist releases into catalog entries, skipping unparsable versions
pub(super) fn entries_from_releases(releases: Vec<DistRelease>) -> Vec<CatalogEntry> {
    releases
        .into_iter()
        .filter_map(|release| {
            let version = match normalize_version(&release.version) {
                Ok(version) => version,
                Err(e) => {
                    tracing::debug!(version = %release.version, error = %e, "skipping release");
                    return None;
                }
            };
            let date = release
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            let lts = release.lts.as_str().map(str::to_string);
            Some(CatalogEntry { version, date, lts })
        })
        .collect()
}

impl NodeDistSource {
    /// Create a source pointing at nodejs.org
    pub fn new(client: HttpClient) -> Self {
        Self::with_url(client, NODE_DIST_URL)
    }

    /// Create a source pointing at a mirror
    pub fn with_url(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            engine: EngineName::node(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the index URL
    fn build_url(&self) -> String {
        format!("{}/index.json", self.base_url)
    }
}

#[async_trait]
impl CatalogSource for NodeDistSource {
    fn engine(&self) -> &EngineName {
        &self.engine
    }

    fn source_name(&self) -> String {
        self.base_url
            .split("://")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .unwrap_or(&self.base_url)
            .to_string()
    }

    async fn fetch(&self) -> Result<VersionCatalog, CatalogError> {
        let url = self.build_url();
        let source_name = self.source_name();
        tracing::debug!(%url, "fetching node release index");

        let releases: Vec<DistRelease> = self
            .client
            .get_json(&url, self.engine.as_str(), &source_name)
            .await?;

        let catalog = VersionCatalog::new(self.engine.clone(), entries_from_releases(releases));
        if catalog.is_empty() {
            return Err(CatalogError::Empty {
                engine: self.engine.to_string(),
                source_name,
            });
        }

        tracing::debug!(count = catalog.len(), "fetched node releases");
        Ok(catalog)
    }
}
