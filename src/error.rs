//! Application error types using thiserror
//!
//! Error hierarchy:
//! - CatalogError: Issues acquiring the list of released engine versions
//! - InventoryError: Issues reading the dependency tree
//! - ManifestError: Issues with the root package.json
//! - ConfigError: Issues with CLI configuration
//! - SynthesisError: A synthesized range failed verification (internal defect)
//! - RangeError: A malformed range expression (recovered locally)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::EngineName;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Catalog acquisition errors
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Dependency tree errors
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Root manifest errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal consistency errors
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// A background acquisition task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors related to fetching an engine's version catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Network request failed
    #[error("failed to fetch {engine} versions from {source_name}: {message}")]
    NetworkError {
        engine: String,
        source_name: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {source_name}")]
    RateLimitExceeded { source_name: String },

    /// Not found (bad URL or unknown engine)
    #[error("{engine} version list not found at {source_name}")]
    NotFound { engine: String, source_name: String },

    /// Invalid response body
    #[error("invalid response from {source_name} for {engine}: {message}")]
    InvalidResponse {
        engine: String,
        source_name: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching {engine} versions from {source_name}")]
    Timeout { engine: String, source_name: String },

    /// Local catalog file could not be read
    #[error("failed to read catalog file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog contained no usable versions
    #[error("no released {engine} versions found in {source_name}")]
    Empty { engine: String, source_name: String },
}

/// Errors related to reading the dependency tree
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Neither a lockfile nor node_modules exists
    #[error("no lockfile or node_modules found in {path}; run `npm install` first")]
    NoTree { path: PathBuf },

    /// The requested tree is missing
    #[error("{what} not found in {path}")]
    Missing { what: &'static str, path: PathBuf },

    /// Failed to read a file in the tree
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON in the tree
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// Lockfile format without engine information
    #[error("lockfile {path} has lockfileVersion {version}; version 2 or later is required")]
    UnsupportedLockfile { path: PathBuf, version: u64 },
}

/// Errors related to the root package.json
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// The manifest could not be rewritten
    #[error("failed to update engines.{engine} in {path}: {message}")]
    UpdateFailed {
        path: PathBuf,
        engine: String,
        message: String,
    },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No catalog source exists for this engine
    #[error("unsupported engine '{engine}': no version catalog is available (use --catalog)")]
    UnsupportedEngine { engine: String },

    /// Invalid path
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: PathBuf, message: String },

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

/// A synthesized range did not reproduce the version set it was built from
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error(
        "internal error: synthesized {engine} range '{candidate}' does not match versions [{}]; please report this",
        .versions.join(", ")
    )]
    Inconsistent {
        engine: EngineName,
        versions: Vec<String>,
        candidate: String,
    },
}

/// A range expression that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid range '{range}': {message}")]
pub struct RangeError {
    pub range: String,
    pub message: String,
}

impl RangeError {
    /// Creates a new RangeError
    pub fn new(range: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            message: message.into(),
        }
    }
}

impl CatalogError {
    /// Creates a new NetworkError
    pub fn network_error(
        engine: impl Into<String>,
        source_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CatalogError::NetworkError {
            engine: engine.into(),
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        engine: impl Into<String>,
        source_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CatalogError::InvalidResponse {
            engine: engine.into(),
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(engine: impl Into<String>, source_name: impl Into<String>) -> Self {
        CatalogError::Timeout {
            engine: engine.into(),
            source_name: source_name.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(source_name: impl Into<String>) -> Self {
        CatalogError::RateLimitExceeded {
            source_name: source_name.into(),
        }
    }
}

impl InventoryError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InventoryError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        InventoryError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}
