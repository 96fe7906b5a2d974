//! Root manifest reading and rewriting
//!
//! This module provides functionality to:
//! - Read the project's package.json and its `engines` declarations
//! - Rewrite `engines.<engine>` while preserving the file's formatting

mod package_json;
mod writer;

pub use package_json::{parse_engines, set_engine_range, RootManifest, PACKAGE_JSON};
pub use writer::{read_manifest, write_manifest, ManifestWriter, WriteResult};
