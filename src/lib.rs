//! Ratecheck - threshold predicates over pre-aggregated rate counters
//!
//! Counters are aggregated upstream into five fixed windows (1, 2, 5, 15
//! and 30 minutes). This crate decides pass/fail over those counters: a
//! global sanity check, a source-filtered fast check, and a
//! request-scoped fast check. Enforcing a rejection is left to the caller.

pub mod config;
pub mod error;
pub mod ratelimit;
pub mod snapshot;
pub mod watch;
