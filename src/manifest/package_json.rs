//! Root package.json reading and `engines` rewriting
//!
//! Rewrites are plain text edits so key order, indentation and trailing
//! newlines survive untouched.

use crate::domain::EngineName;
use crate::error::ManifestError;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Manifest file name
pub const PACKAGE_JSON: &str = "package.json";

/// The `: {` that opens an object value right after a key
static OBJECT_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*:\s*\{").unwrap());
static INDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?m)^([ \t]+)""#).unwrap());

/// The project's own package.json
#[derive(Debug, Clone)]
pub struct RootManifest {
    /// Path to package.json
    pub path: PathBuf,
    /// Package name, if declared
    pub name: Option<String>,
    /// Package version, if declared
    pub version: Option<String>,
    /// Declared engine ranges
    pub engines: BTreeMap<EngineName, String>,
    /// Raw file content
    pub content: String,
}

impl RootManifest {
    /// Reads `package.json` from a project directory
    pub fn read(dir: &Path) -> Result<Self, ManifestError> {
        let path = dir.join(PACKAGE_JSON);
        if !path.exists() {
            return Err(ManifestError::not_found(&path));
        }
        let content = super::read_manifest(&path)?;
        Self::parse(path, content)
    }

    /// Parses manifest content
    pub fn parse(path: impl Into<PathBuf>, content: String) -> Result<Self, ManifestError> {
        let path = path.into();
        let json: Value = serde_json::from_str(&content)
            .map_err(|e| ManifestError::json_parse_error(&path, e.to_string()))?;

        let name = json.get("name").and_then(Value::as_str).map(str::to_string);
        let version = json
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            engines: json.get("engines").map(parse_engines).unwrap_or_default(),
            path,
            name,
            version,
            content,
        })
    }

    /// The declared range for an engine
    pub fn engine_range(&self, engine: &EngineName) -> Option<&str> {
        self.engines.get(engine).map(String::as_str)
    }

    /// Display label: the package name, or the directory it lives in
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "root".to_string())
        })
    }
}

/// Reads an `engines` object of strings; any other shape yields nothing
pub fn parse_engines(engines: &Value) -> BTreeMap<EngineName, String> {
    let Some(object) = engines.as_object() else {
        tracing::debug!("ignoring non-object engines field");
        return BTreeMap::new();
    };

    object
        .iter()
        .filter_map(|(engine, range)| {
            range
                .as_str()
                .map(|range| (EngineName::new(engine.as_str()), range.to_string()))
        })
        .collect()
}

/// Sets `engines.<engine>` to `range` in package.json text
///
/// An existing value is replaced in place, a missing key is added to the
/// `engines` object, and a missing `engines` object is appended to the
/// top-level object.
pub fn set_engine_range(
    path: &Path,
    content: &str,
    engine: &EngineName,
    range: &str,
) -> Result<String, ManifestError> {
    let indent = detect_indent(content);
    let entry = format!(
        "\"{}\": {}",
        engine.as_str(),
        serde_json::Value::String(range.to_string())
    );

    let updated = match top_level_engines(content) {
        Some((body_start, body_end)) => {
            let body = &content[body_start..body_end];

            let key = Regex::new(&format!(
                r#"("{}"\s*:\s*)"(?:[^"\\]|\\.)*""#,
                regex::escape(engine.as_str())
            ))
            .map_err(|e| update_failed(path, engine, &format!("invalid regex pattern: {}", e)))?;

            let new_body = if key.is_match(body) {
                key.replace(body, |caps: &regex::Captures| {
                    format!("{}{}", &caps[1], Value::String(range.to_string()))
                })
                .into_owned()
            } else if body.trim().is_empty() {
                format!("\n{}{}{}\n{}", indent, indent, entry, indent)
            } else {
                format!("\n{}{}{},{}", indent, indent, entry, body)
            };

            format!("{}{}{}", &content[..body_start], new_body, &content[body_end..])
        }
        None => {
            let json: Value = serde_json::from_str(content)
                .map_err(|e| update_failed(path, engine, &format!("invalid JSON: {}", e)))?;
            if json.get("engines").is_some() {
                return Err(update_failed(path, engine, "engines is not an object"));
            }
            let close = content
                .rfind('}')
                .ok_or_else(|| update_failed(path, engine, "no top-level object"))?;
            let head = content[..close].trim_end();
            let separator = if head.ends_with('{') { "" } else { "," };
            format!(
                "{}{}\n{}\"engines\": {{\n{}{}{}\n{}}}\n{}",
                head,
                separator,
                indent,
                indent,
                indent,
                entry,
                indent,
                &content[close..]
            )
        }
    };

    // The edit must still be valid JSON carrying the new value
    let json: Value = serde_json::from_str(&updated)
        .map_err(|e| update_failed(path, engine, &format!("rewrite produced invalid JSON: {}", e)))?;
    let engines = json.get("engines").map(parse_engines).unwrap_or_default();
    if engines.get(engine).map(String::as_str) != Some(range) {
        return Err(update_failed(path, engine, "rewrite did not take effect"));
    }

    Ok(updated)
}

/// Byte span of the top-level `engines` object body, between its braces
///
/// Objects named `engines` nested deeper (inside `overrides` or a bundled
/// manifest copy, say) are skipped.
fn top_level_engines(content: &str) -> Option<(usize, usize)> {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut body_start = None;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let end = string_end(bytes, i)?;
                if depth == 1 && body_start.is_none() && &content[i + 1..end] == "engines" {
                    if let Some(open) = OBJECT_VALUE_RE.find(&content[end + 1..]) {
                        depth += 1;
                        i = end + 1 + open.end();
                        body_start = Some(i);
                        continue;
                    }
                }
                i = end;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                if depth == 2 && body_start.is_some() {
                    return body_start.map(|start| (start, i));
                }
                depth = depth.checked_sub(1)?;
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Index of the quote closing the string that opens at `start`
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn detect_indent(content: &str) -> String {
    INDENT_RE
        .captures(content)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "  ".to_string())
}

fn update_failed(path: &Path, engine: &EngineName, message: &str) -> ManifestError {
    ManifestError::UpdateFailed {
        path: path.to_path_buf(),
        engine: engine.to_string(),
        message: message.to_string(),
    }
}
