//! npm-style semver ranges
//!
//! A range is an OR (`||`) of comparator sets, and each comparator set is an
//! AND (whitespace) of primitive comparators. Caret, tilde, partial, wildcard
//! and hyphen forms are desugared into primitive comparators at parse time,
//! so matching only ever deals with `=`, `<`, `<=`, `>`, `>=`.

mod parser;

pub use parser::{is_wildcard, normalize_version};

use crate::error::RangeError;
use semver::Version;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Primitive comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Op {
    fn symbol(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
        }
    }
}

/// A single `op version` test
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparator {
    pub op: Op,
    pub version: Version,
}

impl Comparator {
    pub fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    /// Tests a version against this comparator, ignoring the pre-release rule
    pub fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Eq => version == &self.version,
            Op::Gt => version > &self.version,
            Op::Gte => version >= &self.version,
            Op::Lt => version < &self.version,
            Op::Lte => version <= &self.version,
        }
    }

    fn allows_prerelease_of(&self, version: &Version) -> bool {
        !self.version.pre.is_empty()
            && self.version.major == version.major
            && self.version.minor == version.minor
            && self.version.patch == version.patch
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.version)
    }
}

/// Comparators that must all hold; empty means "any version"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ComparatorSet(pub Vec<Comparator>);

impl ComparatorSet {
    pub fn any() -> Self {
        Self(Vec::new())
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    pub fn satisfies(&self, version: &Version) -> bool {
        if !self.0.iter().all(|c| c.matches(version)) {
            return false;
        }
        // A pre-release only matches when some comparator opts into
        // pre-releases of the same major.minor.patch.
        version.pre.is_empty() || self.0.iter().any(|c| c.allows_prerelease_of(version))
    }
}

impl fmt::Display for ComparatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "*");
        }
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// A parsed range expression
#[derive(Debug, Clone)]
pub struct RangeSet {
    raw: String,
    sets: Vec<ComparatorSet>,
}

impl RangeSet {
    /// Parses a range expression
    pub fn parse(input: &str) -> Result<Self, RangeError> {
        let sets = parser::parse_range(input)?;
        Ok(Self {
            raw: input.trim().to_string(),
            sets,
        })
    }

    /// The universal range `*`
    pub fn any() -> Self {
        Self {
            raw: "*".to_string(),
            sets: vec![ComparatorSet::any()],
        }
    }

    /// Returns true if the version satisfies any alternative
    pub fn satisfies(&self, version: &Version) -> bool {
        self.sets.iter().any(|set| set.satisfies(version))
    }

    /// Returns true if some alternative places no restriction at all
    pub fn is_any(&self) -> bool {
        self.sets.iter().any(ComparatorSet::is_any)
    }

    /// The expression as written
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The desugared alternatives
    pub fn comparator_sets(&self) -> &[ComparatorSet] {
        &self.sets
    }

    /// The desugared form, e.g. `>=14.0.0 <15.0.0-0 || >=16.0.0`
    pub fn desugared(&self) -> String {
        let parts: Vec<String> = self.sets.iter().map(|s| s.to_string()).collect();
        parts.join(" || ")
    }
}

impl PartialEq for RangeSet {
    fn eq(&self, other: &Self) -> bool {
        self.sets == other.sets
    }
}

impl Eq for RangeSet {}

impl FromStr for RangeSet {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for RangeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn sat(range: &str, version: &str) -> bool {
        RangeSet::parse(range).unwrap().satisfies(&v(version))
    }

    #[test]
    fn test_any_matches_everything_stable() {
        let any = RangeSet::any();
        assert!(any.is_any());
        assert!(any.satisfies(&v("0.1.14")));
        assert!(any.satisfies(&v("22.3.0")));
    }

    #[test]
    fn test_caret_major() {
        assert!(sat("^14", "14.0.0"));
        assert!(sat("^14", "14.21.3"));
        assert!(!sat("^14", "15.0.0"));
        assert!(!sat("^14", "13.14.0"));
    }

    #[test]
    fn test_caret_major_minor() {
        assert!(sat("^14.17", "14.17.0"));
        assert!(sat("^14.17", "14.20.1"));
        assert!(!sat("^14.17", "14.16.1"));
        assert!(!sat("^14.17", "15.0.0"));
    }

    #[test]
    fn test_caret_zero_major() {
        assert!(sat("^0.10", "0.10.48"));
        assert!(!sat("^0.10", "0.11.0"));
        assert!(sat("^0.0.3", "0.0.3"));
        assert!(!sat("^0.0.3", "0.0.4"));
    }

    #[test]
    fn test_threshold_with_space() {
        assert!(sat(">= 2.0", "2.0.0"));
        assert!(sat(">= 2.0", "3.0.0"));
        assert!(!sat(">= 2.0", "1.9.0"));
    }

    #[test]
    fn test_or_of_ranges() {
        assert!(sat("^14 || ^18", "14.5.0"));
        assert!(sat("^14 || ^18", "18.0.0"));
        assert!(!sat("^14 || ^18", "16.0.0"));
    }

    #[test]
    fn test_and_of_comparators() {
        assert!(sat(">=8 <13", "12.22.12"));
        assert!(!sat(">=8 <13", "13.0.0"));
        assert!(!sat(">=8 <13", "7.10.1"));
    }

    #[test]
    fn test_prerelease_excluded_by_default() {
        assert!(!sat(">=1.0.0", "2.0.0-beta.1"));
        assert!(sat(">=2.0.0-beta.0", "2.0.0-beta.1"));
        assert!(!sat(">=2.0.0-beta.0", "2.0.1-beta.1"));
    }

    #[test]
    fn test_desugared_caret() {
        let range = RangeSet::parse("^1.2").unwrap();
        assert_eq!(range.desugared(), ">=1.2.0 <2.0.0-0");
    }

    #[test]
    fn test_equality_ignores_raw_text() {
        let a = RangeSet::parse("=14").unwrap();
        let b = RangeSet::parse("= 14").unwrap();
        assert_eq!(a, b);
        assert_ne!(a.raw(), b.raw());
    }

    #[test]
    fn test_from_str() {
        let range: RangeSet = ">=16".parse().unwrap();
        assert_eq!(range.raw(), ">=16");
    }

    #[test]
    fn test_serialize_as_raw_string() {
        let range = RangeSet::parse("^18 || >=20").unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, "\"^18 || >=20\"");
    }
}
