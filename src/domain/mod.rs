//! Core domain models for engine-compat
//!
//! This module contains the fundamental types used throughout the application:
//! - Engine names
//! - Package records read from the dependency inventory
//! - Engine constraints extracted from those records
//! - Tri-state flags for options whose default depends on other options

mod constraint;
mod engine;
mod package;
mod tri_state;

pub use constraint::{Constraint, ConstraintSource};
pub use engine::EngineName;
pub use package::PackageRecord;
pub use tri_state::TriState;
