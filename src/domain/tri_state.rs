//! Tri-state option values
//!
//! Some options change their default depending on other options, so we need
//! to know whether the user set them at all.

use serde::{Deserialize, Serialize};

/// An option that is either unset or explicitly set to a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    /// Not given on the command line
    #[default]
    Unset,
    /// Given explicitly
    Explicit(bool),
}

impl TriState {
    /// Builds a tri-state from a pair of `--flag` / `--no-flag` switches
    pub fn from_flags(on: bool, off: bool) -> Self {
        match (on, off) {
            (true, _) => TriState::Explicit(true),
            (false, true) => TriState::Explicit(false),
            (false, false) => TriState::Unset,
        }
    }

    /// Returns true if the value was given explicitly
    pub fn is_explicit(&self) -> bool {
        matches!(self, TriState::Explicit(_))
    }

    /// Resolves the value, falling back to `default` when unset
    pub fn resolve(&self, default: bool) -> bool {
        match self {
            TriState::Unset => default,
            TriState::Explicit(value) => *value,
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        value.map_or(TriState::Unset, TriState::Explicit)
    }
}
