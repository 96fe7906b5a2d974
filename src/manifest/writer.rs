//! Manifest file writing
//!
//! This module provides:
//! - ManifestWriter for applying engine range updates to the root package.json
//! - Dry-run mode support (no actual file modifications)
//! - Per-engine failures recorded without aborting the other updates

use super::package_json::{set_engine_range, RootManifest};
use crate::domain::EngineName;
use crate::error::ManifestError;
use std::fs;
use std::path::{Path, PathBuf};

/// Writer that applies `engines` updates to the root manifest
pub struct ManifestWriter {
    /// Whether to run in dry-run mode (no file modifications)
    dry_run: bool,
}

/// Result of applying updates to a manifest file
#[derive(Debug)]
pub struct WriteResult {
    /// Path to the manifest file
    pub path: PathBuf,
    /// Engines whose range was set
    pub applied: Vec<(EngineName, String)>,
    /// Whether the file was actually modified
    pub file_modified: bool,
    /// Content after the updates
    pub content: String,
    /// Errors encountered during update
    pub errors: Vec<String>,
}

impl WriteResult {
    fn new(path: impl Into<PathBuf>, content: String) -> Self {
        Self {
            path: path.into(),
            applied: Vec::new(),
            file_modified: false,
            content,
            errors: Vec::new(),
        }
    }

    /// Returns true if any updates were successfully applied
    pub fn has_updates(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Returns true if any errors occurred
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl ManifestWriter {
    /// Create a new ManifestWriter
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Create a ManifestWriter in dry-run mode
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    /// Check if this writer is in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Sets each `(engine, range)` pair in the manifest
    ///
    /// Ranges equal to what is already declared are skipped.
    pub fn apply_updates(
        &self,
        manifest: &RootManifest,
        updates: &[(EngineName, String)],
    ) -> Result<WriteResult, ManifestError> {
        let mut result = WriteResult::new(&manifest.path, manifest.content.clone());

        for (engine, range) in updates {
            if manifest.engine_range(engine) == Some(range.as_str()) {
                continue;
            }
            match set_engine_range(&manifest.path, &result.content, engine, range) {
                Ok(updated) => {
                    result.content = updated;
                    result.applied.push((engine.clone(), range.clone()));
                }
                Err(e) => {
                    tracing::warn!(%engine, error = %e, "failed to update engines range");
                    result
                        .errors
                        .push(format!("Failed to update engines.{}: {}", engine, e));
                }
            }
        }

        if result.has_updates() && !self.dry_run {
            write_manifest(&manifest.path, &result.content)?;
            result.file_modified = true;
            tracing::info!(path = %manifest.path.display(), "updated manifest");
        }

        Ok(result)
    }
}

/// Read a manifest file content safely
pub fn read_manifest(path: &Path) -> Result<String, ManifestError> {
    fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))
}

/// Write content to a manifest file
pub fn write_manifest(path: &Path, content: &str) -> Result<(), ManifestError> {
    fs::write(path, content).map_err(|e| ManifestError::write_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONTENT: &str = "{\n  \"name\": \"app\",\n  \"engines\": {\n    \"node\": \">= 12\"\n  }\n}\n";

    fn manifest_in(dir: &TempDir, content: &str) -> RootManifest {
        fs::write(dir.path().join("package.json"), content).unwrap();
        RootManifest::read(dir.path()).unwrap()
    }

    fn node(range: &str) -> Vec<(EngineName, String)> {
        vec![(EngineName::node(), range.to_string())]
    }

    #[test]
    fn test_manifest_writer_new() {
        assert!(!ManifestWriter::new(false).is_dry_run());
        assert!(ManifestWriter::new(true).is_dry_run());
        assert!(ManifestWriter::dry_run().is_dry_run());
    }

    #[test]
    fn test_apply_updates_writes_file() {
        let dir = TempDir::new().unwrap();
        let manifest = manifest_in(&dir, CONTENT);

        let result = ManifestWriter::new(false)
            .apply_updates(&manifest, &node(">= 16"))
            .unwrap();

        assert!(result.has_updates());
        assert!(result.file_modified);
        let written = fs::read_to_string(dir.path().join("package.json")).unwrap();
        assert!(written.contains(r#""node": ">= 16""#));
        assert!(written.ends_with("}\n"));
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let dir = TempDir::new().unwrap();
        let manifest = manifest_in(&dir, CONTENT);

        let result = ManifestWriter::dry_run()
            .apply_updates(&manifest, &node(">= 16"))
            .unwrap();

        assert!(result.has_updates());
        assert!(!result.file_modified);
        assert!(result.content.contains(r#""node": ">= 16""#));
        let on_disk = fs::read_to_string(dir.path().join("package.json")).unwrap();
        assert_eq!(on_disk, CONTENT);
    }

    #[test]
    fn test_unchanged_range_is_skipped() {
        let dir = TempDir::new().unwrap();
        let manifest = manifest_in(&dir, CONTENT);

        let result = ManifestWriter::new(false)
            .apply_updates(&manifest, &node(">= 12"))
            .unwrap();

        assert!(!result.has_updates());
        assert!(!result.file_modified);
    }

    #[test]
    fn test_multiple_engines() {
        let dir = TempDir::new().unwrap();
        let manifest = manifest_in(&dir, CONTENT);
        let updates = vec![
            (EngineName::node(), ">= 18".to_string()),
            (EngineName::new("npm"), ">= 9".to_string()),
        ];

        let result = ManifestWriter::new(false)
            .apply_updates(&manifest, &updates)
            .unwrap();

        assert_eq!(result.applied.len(), 2);
        assert!(!result.has_errors());
        let reread = RootManifest::read(dir.path()).unwrap();
        assert_eq!(reread.engine_range(&EngineName::new("npm")), Some(">= 9"));
        assert_eq!(reread.engine_range(&EngineName::node()), Some(">= 18"));
    }

    #[test]
    fn test_read_manifest_missing() {
        let result = read_manifest(Path::new("/nonexistent/package.json"));
        assert!(matches!(result, Err(ManifestError::ReadError { .. })));
    }
}
