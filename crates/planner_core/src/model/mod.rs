//! Planner domain model.
//!
//! # Responsibility
//! - Mirror the external task record shape (read-only input).
//! - Define derived occurrence values and their presentation attributes.
//!
//! # Invariants
//! - Tasks are never written by core.
//! - Occurrence identity is structural, never a formatted string.

pub mod color;
pub mod occurrence;
pub mod task;
pub mod wall_clock;
