//! Runtime probing for the currently installed engine
//!
//! This module provides:
//! - Detection of the installed engine version (`<engine> --version`)
//! - A check of that version against a resolved valid set

use crate::domain::EngineName;
use crate::range::normalize_version;
use semver::Version;
use serde::Serialize;
use std::path::Path;
use std::process::{Command, Output};

/// Trait for querying the installed version of an engine
pub trait RuntimeProbe {
    /// The installed version, or None when the engine is missing or its
    /// output is not a version
    fn current_version(&self, engine: &EngineName) -> Option<Version>;
}

/// Probe that executes the engine binary found on PATH
#[derive(Debug, Default)]
pub struct SystemRuntimeProbe;

impl SystemRuntimeProbe {
    /// Create a new system probe
    pub fn new() -> Self {
        Self
    }

    /// Run a command and capture output
    fn run_command(&self, program: &str, args: &[&str], working_dir: &Path) -> std::io::Result<Output> {
        Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .output()
    }
}

impl RuntimeProbe for SystemRuntimeProbe {
    fn current_version(&self, engine: &EngineName) -> Option<Version> {
        let output = match self.run_command(engine.as_str(), &["--version"], Path::new(".")) {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(%engine, error = %e, "failed to execute engine");
                return None;
            }
        };

        if !output.status.success() {
            tracing::debug!(%engine, status = %output.status, "engine --version failed");
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_version_output(&stdout)
    }
}

/// First line of `--version` output as a version (`v20.11.0` -> 20.11.0)
pub fn parse_version_output(output: &str) -> Option<Version> {
    output
        .lines()
        .next()
        .and_then(|line| normalize_version(line.trim()).ok())
}

/// The installed engine version and whether it is acceptable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentRuntime {
    pub engine: EngineName,
    /// Installed version, if it could be determined
    pub version: Option<Version>,
    /// Whether the installed version is in the valid set
    pub satisfies: bool,
}

/// Checks the installed version of `engine` against `valid`
pub fn check_current<P: RuntimeProbe + ?Sized>(
    probe: &P,
    engine: &EngineName,
    valid: &[Version],
) -> CurrentRuntime {
    let version = probe.current_version(engine);
    let satisfies = version.as_ref().is_some_and(|v| valid.contains(v));
    tracing::debug!(%engine, version = ?version, satisfies, "checked installed runtime");
    CurrentRuntime {
        engine: engine.clone(),
        version,
        satisfies,
    }
}
