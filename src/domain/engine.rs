//! Engine name type for runtimes whose version compatibility is checked

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a runtime engine as it appears in a package's `engines` field
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineName(String);

impl EngineName {
    /// The Node.js runtime
    pub const NODE: &'static str = "node";

    /// Creates a new engine name, trimming surrounding whitespace
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self(name.trim().to_string())
    }

    /// Shorthand for the `node` engine
    pub fn node() -> Self {
        Self::new(Self::NODE)
    }

    /// Returns the engine name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the `node` engine
    pub fn is_node(&self) -> bool {
        self.0 == Self::NODE
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &str {
        match self.0.as_str() {
            "node" => "Node.js",
            "npm" => "npm",
            other => other,
        }
    }
}

impl fmt::Display for EngineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EngineName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EngineName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for EngineName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
