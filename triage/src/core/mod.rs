//! Deterministic, pure triage logic.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures, take the current instant as a parameter and return
//! deterministic outputs suitable for tests.

pub mod answers;
pub mod checklist;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod invariants;
pub mod score_table;
pub mod snapshot;
pub mod state_update;
pub mod timers;
pub mod types;
