//! Range expression parser
//!
//! Handles:
//! - Comparators: `>=1.2.3`, `> 1.2`, `<2`, `<=1.2`, `=14`, `= 14`
//! - Caret and tilde: `^1.2.3`, `^0.10`, `~1.2`, `~>1.2`
//! - Partials and wildcards: `1`, `1.2`, `1.x`, `*`, empty string
//! - Hyphen ranges: `1.2.3 - 2.3`
//! - Alternatives: `^14 || >=16`

use super::{Comparator, ComparatorSet, Op};
use crate::error::RangeError;
use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};
use std::sync::LazyLock;

static HYPHEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+-\s+(\S+)$").unwrap());
static OP_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(~>|>=|<=|[~^<>=])\s+").unwrap());
static PRIMITIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(~>|>=|<=|[~^<>=])?=?v?(.*)$").unwrap());
static PARTIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([0-9]+|[xX*])(?:\.([0-9]+|[xX*])(?:\.([0-9]+|[xX*])(?:-([0-9A-Za-z.-]+))?(?:\+[0-9A-Za-z.-]+)?)?)?$",
    )
    .unwrap()
});

/// Returns true for ranges that admit every version (`*`, `x`, `X`, empty)
pub fn is_wildcard(range: &str) -> bool {
    matches!(range.trim(), "" | "*" | "x" | "X")
}

/// Parses a version token, tolerating a leading `v`
pub fn normalize_version(token: &str) -> Result<Version, semver::Error> {
    let token = token.trim();
    let token = token.strip_prefix('v').unwrap_or(token);
    Version::parse(token)
}

/// A version with missing or wildcard components
#[derive(Debug, Default)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Option<Prerelease>,
}

impl Partial {
    /// The partial with missing components filled by zero
    fn lower(&self, major: u64) -> Version {
        match (self.minor, self.patch) {
            (Some(minor), Some(patch)) => Version {
                major,
                minor,
                patch,
                pre: self.pre.clone().unwrap_or(Prerelease::EMPTY),
                build: BuildMetadata::EMPTY,
            },
            (minor, _) => Version::new(major, minor.unwrap_or(0), 0),
        }
    }
}

pub(super) fn parse_range(input: &str) -> Result<Vec<ComparatorSet>, RangeError> {
    input
        .trim()
        .split("||")
        .map(|alternative| parse_comparator_set(alternative.trim(), input))
        .collect()
}

fn parse_comparator_set(alternative: &str, input: &str) -> Result<ComparatorSet, RangeError> {
    if let Some(caps) = HYPHEN_RE.captures(alternative) {
        let from = parse_partial(strip_prefixes(&caps[1]), input)?;
        let to = parse_partial(strip_prefixes(&caps[2]), input)?;
        return Ok(ComparatorSet(hyphen(&from, &to, input)?));
    }

    // `>= 2.0` is the same comparator as `>=2.0`
    let collapsed = OP_SPACE_RE.replace_all(alternative, "${1}");
    let mut comparators = Vec::new();
    for token in collapsed.split_whitespace() {
        comparators.extend(parse_primitive(token, input)?);
    }
    Ok(ComparatorSet(comparators))
}

fn parse_primitive(token: &str, input: &str) -> Result<Vec<Comparator>, RangeError> {
    let caps = PRIMITIVE_RE
        .captures(token)
        .ok_or_else(|| RangeError::new(input, format!("unrecognized comparator '{}'", token)))?;
    let op = caps.get(1).map_or("", |m| m.as_str());
    let rest = caps.get(2).map_or("", |m| m.as_str());

    if !op.is_empty() && rest.is_empty() {
        return Err(RangeError::new(
            input,
            format!("operator '{}' is missing a version", op),
        ));
    }

    let partial = parse_partial(rest, input)?;
    desugar(op, &partial, input)
}

fn strip_prefixes(token: &str) -> &str {
    let token = token.trim_start_matches('=');
    token.strip_prefix('v').unwrap_or(token)
}

fn parse_partial(text: &str, input: &str) -> Result<Partial, RangeError> {
    if text.is_empty() {
        return Ok(Partial::default());
    }

    let caps = PARTIAL_RE
        .captures(text)
        .ok_or_else(|| RangeError::new(input, format!("invalid version '{}'", text)))?;

    let component = |index: usize| -> Result<Option<u64>, RangeError> {
        match caps.get(index).map(|m| m.as_str()) {
            None | Some("x") | Some("X") | Some("*") => Ok(None),
            Some(digits) => digits.parse::<u64>().map(Some).map_err(|e| {
                RangeError::new(input, format!("invalid version number '{}': {}", digits, e))
            }),
        }
    };

    let major = component(1)?;
    let minor = major.and(component(2)?);
    let patch = minor.and(component(3)?);

    let pre = match (patch, caps.get(4)) {
        (Some(_), Some(tag)) => Some(Prerelease::new(tag.as_str()).map_err(|e| {
            RangeError::new(input, format!("invalid pre-release '{}': {}", tag.as_str(), e))
        })?),
        _ => None,
    };

    Ok(Partial {
        major,
        minor,
        patch,
        pre,
    })
}

/// The lowest possible version of `major.minor.patch`, i.e. `major.minor.patch-0`
fn floor(major: u64, minor: u64, patch: u64, input: &str) -> Result<Version, RangeError> {
    let pre = Prerelease::new("0")
        .map_err(|e| RangeError::new(input, format!("invalid bound: {}", e)))?;
    Ok(Version {
        major,
        minor,
        patch,
        pre,
        build: BuildMetadata::EMPTY,
    })
}

fn matches_nothing(input: &str) -> Result<Vec<Comparator>, RangeError> {
    Ok(vec![Comparator::new(Op::Lt, floor(0, 0, 0, input)?)])
}

fn between(lower: Version, upper: Version) -> Vec<Comparator> {
    vec![
        Comparator::new(Op::Gte, lower),
        Comparator::new(Op::Lt, upper),
    ]
}

fn desugar(op: &str, partial: &Partial, input: &str) -> Result<Vec<Comparator>, RangeError> {
    let Some(major) = partial.major else {
        return match op {
            ">" | "<" => matches_nothing(input),
            _ => Ok(Vec::new()),
        };
    };
    let next_major = major.saturating_add(1);

    let comparators = match op {
        "" | "=" => match (partial.minor, partial.patch) {
            (None, _) => between(Version::new(major, 0, 0), floor(next_major, 0, 0, input)?),
            (Some(minor), None) => between(
                Version::new(major, minor, 0),
                floor(major, minor.saturating_add(1), 0, input)?,
            ),
            (Some(_), Some(_)) => vec![Comparator::new(Op::Eq, partial.lower(major))],
        },
        "^" => match (partial.minor, partial.patch) {
            (None, _) => between(Version::new(major, 0, 0), floor(next_major, 0, 0, input)?),
            (Some(minor), None) if major == 0 => between(
                Version::new(0, minor, 0),
                floor(0, minor.saturating_add(1), 0, input)?,
            ),
            (Some(minor), None) => {
                between(Version::new(major, minor, 0), floor(next_major, 0, 0, input)?)
            }
            (Some(minor), Some(patch)) => {
                let upper = if major > 0 {
                    floor(next_major, 0, 0, input)?
                } else if minor > 0 {
                    floor(0, minor.saturating_add(1), 0, input)?
                } else {
                    floor(0, 0, patch.saturating_add(1), input)?
                };
                between(partial.lower(major), upper)
            }
        },
        "~" | "~>" => match partial.minor {
            None => between(Version::new(major, 0, 0), floor(next_major, 0, 0, input)?),
            Some(minor) => between(
                partial.lower(major),
                floor(major, minor.saturating_add(1), 0, input)?,
            ),
        },
        ">" => match (partial.minor, partial.patch) {
            (None, _) => vec![Comparator::new(Op::Gte, Version::new(next_major, 0, 0))],
            (Some(minor), None) => vec![Comparator::new(
                Op::Gte,
                Version::new(major, minor.saturating_add(1), 0),
            )],
            (Some(_), Some(_)) => vec![Comparator::new(Op::Gt, partial.lower(major))],
        },
        ">=" => vec![Comparator::new(Op::Gte, partial.lower(major))],
        "<" => match (partial.minor, partial.patch) {
            (None, _) => vec![Comparator::new(Op::Lt, floor(major, 0, 0, input)?)],
            (Some(minor), None) => vec![Comparator::new(Op::Lt, floor(major, minor, 0, input)?)],
            (Some(_), Some(_)) => vec![Comparator::new(Op::Lt, partial.lower(major))],
        },
        "<=" => match (partial.minor, partial.patch) {
            (None, _) => vec![Comparator::new(Op::Lt, floor(next_major, 0, 0, input)?)],
            (Some(minor), None) => vec![Comparator::new(
                Op::Lt,
                floor(major, minor.saturating_add(1), 0, input)?,
            )],
            (Some(_), Some(_)) => vec![Comparator::new(Op::Lte, partial.lower(major))],
        },
        other => {
            return Err(RangeError::new(
                input,
                format!("unsupported operator '{}'", other),
            ))
        }
    };

    Ok(comparators)
}

fn hyphen(from: &Partial, to: &Partial, input: &str) -> Result<Vec<Comparator>, RangeError> {
    let mut comparators = Vec::new();

    if let Some(major) = from.major {
        comparators.push(Comparator::new(Op::Gte, from.lower(major)));
    }

    if let Some(major) = to.major {
        let upper = match (to.minor, to.patch) {
            (None, _) => Comparator::new(Op::Lt, floor(major.saturating_add(1), 0, 0, input)?),
            (Some(minor), None) => {
                Comparator::new(Op::Lt, floor(major, minor.saturating_add(1), 0, input)?)
            }
            (Some(_), Some(_)) => Comparator::new(Op::Lte, to.lower(major)),
        };
        comparators.push(upper);
    }

    Ok(comparators)
}

#[cfg(test)]
mod tests {
    use super::super::RangeSet;
    use super::*;

    fn desugared(range: &str) -> String {
        RangeSet::parse(range).unwrap().desugared()
    }

    #[test]
    fn test_is_wildcard() {
        assert!(is_wildcard("*"));
        assert!(is_wildcard(" x "));
        assert!(is_wildcard("X"));
        assert!(is_wildcard(""));
        assert!(!is_wildcard(">=0"));
        assert!(!is_wildcard("1.x"));
    }

    #[test]
    fn test_normalize_version() {
        assert_eq!(normalize_version("v18.1.0").unwrap(), Version::new(18, 1, 0));
        assert_eq!(normalize_version(" 0.10.48 ").unwrap(), Version::new(0, 10, 48));
        assert!(normalize_version("18").is_err());
    }

    #[test]
    fn test_caret_forms() {
        assert_eq!(desugared("^1.2.3"), ">=1.2.3 <2.0.0-0");
        assert_eq!(desugared("^0.2.3"), ">=0.2.3 <0.3.0-0");
        assert_eq!(desugared("^0.0.3"), ">=0.0.3 <0.0.4-0");
        assert_eq!(desugared("^0.10"), ">=0.10.0 <0.11.0-0");
        assert_eq!(desugared("^14"), ">=14.0.0 <15.0.0-0");
    }

    #[test]
    fn test_tilde_forms() {
        assert_eq!(desugared("~1.2.3"), ">=1.2.3 <1.3.0-0");
        assert_eq!(desugared("~1.2"), ">=1.2.0 <1.3.0-0");
        assert_eq!(desugared("~1"), ">=1.0.0 <2.0.0-0");
        assert_eq!(desugared("~>1.2"), ">=1.2.0 <1.3.0-0");
    }

    #[test]
    fn test_partial_and_wildcards() {
        assert_eq!(desugared("1"), ">=1.0.0 <2.0.0-0");
        assert_eq!(desugared("1.2"), ">=1.2.0 <1.3.0-0");
        assert_eq!(desugared("1.x"), ">=1.0.0 <2.0.0-0");
        assert_eq!(desugared("1.2.3"), "=1.2.3");
        assert_eq!(desugared("*"), "*");
        assert_eq!(desugared(""), "*");
    }

    #[test]
    fn test_comparator_forms() {
        assert_eq!(desugared(">1.2"), ">=1.3.0");
        assert_eq!(desugared(">1"), ">=2.0.0");
        assert_eq!(desugared(">1.2.3"), ">1.2.3");
        assert_eq!(desugared(">=1.2"), ">=1.2.0");
        assert_eq!(desugared("<1.2"), "<1.2.0-0");
        assert_eq!(desugared("<=1.2"), "<1.3.0-0");
        assert_eq!(desugared("<=1.2.3"), "<=1.2.3");
        assert_eq!(desugared(">*"), "<0.0.0-0");
        assert_eq!(desugared(">=*"), "*");
    }

    #[test]
    fn test_operator_with_space() {
        assert_eq!(desugared(">= 2.0"), ">=2.0.0");
        assert_eq!(desugared("= 14"), ">=14.0.0 <15.0.0-0");
        assert_eq!(desugared(">= 8 < 13"), ">=8.0.0 <13.0.0-0");
    }

    #[test]
    fn test_equals_without_space() {
        assert_eq!(desugared("=14"), desugared("= 14"));
    }

    #[test]
    fn test_leading_v() {
        assert_eq!(desugared(">=v16.0.0"), ">=16.0.0");
        assert_eq!(desugared("v18"), ">=18.0.0 <19.0.0-0");
    }

    #[test]
    fn test_hyphen_range() {
        assert_eq!(desugared("1.2.3 - 2.3.4"), ">=1.2.3 <=2.3.4");
        assert_eq!(desugared("1.2 - 2.3"), ">=1.2.0 <2.4.0-0");
        assert_eq!(desugared("1 - 2"), ">=1.0.0 <3.0.0-0");
    }

    #[test]
    fn test_alternatives() {
        assert_eq!(
            desugared("^14.17 || >=16"),
            ">=14.17.0 <15.0.0-0 || >=16.0.0"
        );
    }

    #[test]
    fn test_prerelease_in_comparator() {
        assert_eq!(desugared(">=2.0.0-beta.1"), ">=2.0.0-beta.1");
    }

    #[test]
    fn test_malformed_ranges() {
        assert!(RangeSet::parse(">=").is_err());
        assert!(RangeSet::parse("not-a-range").is_err());
        assert!(RangeSet::parse("1.2.3.4").is_err());
        assert!(RangeSet::parse("^abc").is_err());
    }

    #[test]
    fn test_malformed_error_message() {
        let err = RangeSet::parse("banana").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("banana"));
    }
}
