//! engine-compat - Runtime engine compatibility library
//!
//! This library provides the core functionality for checking which engine
//! versions a Node.js dependency graph supports:
//! - Range parsing and filtering against a catalog of released versions
//! - Intersection of every package's `engines` declaration
//! - Synthesis of a short range expression for the resulting set
//! - Reconciliation with the project's own declaration, and `--save`

pub mod catalog;
pub mod cli;
pub mod domain;
pub mod error;
pub mod inventory;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod probe;
pub mod progress;
pub mod range;
pub mod resolve;
