//! Reminder engine: threshold scanning, at-most-once ledger and delivery.
//!
//! # Responsibility
//! - Evaluate every occurrence against the `pre` and `start` thresholds on a
//!   fixed polling cadence.
//! - Guarantee each `(occurrence, threshold)` key fires at most once per
//!   process lifetime.
//!
//! # Invariants
//! - Polling re-scans the full occurrence set; there are no per-occurrence
//!   timers.
//! - The ledger, not timer state, prevents duplicate notifications.

pub mod clock;
pub mod ledger;
pub mod notification;
pub mod runner;
pub mod scanner;
