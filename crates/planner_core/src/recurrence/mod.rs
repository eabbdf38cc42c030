//! Recurrence expansion.
//!
//! # Responsibility
//! - Turn one task record into its bounded, ordered list of occurrences.
//!
//! # Invariants
//! - Expansion is deterministic and performs no I/O besides diagnostics.
//! - Output length never exceeds `ExpansionPolicy::effective_ceiling()`,
//!   which is capped at 260.

pub mod expander;

pub use expander::{expand, expand_shared};
