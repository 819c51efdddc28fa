//! Emergency-department triage: classification and action timers.
//!
//! A patient is classified in up to three timed steps into one of four
//! priorities, after which a priority-specific checklist of actions runs
//! with its own countdowns. The crate enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (scoring, evaluation, transitions,
//!   timers). No I/O and no clock reads; the current instant is a parameter.
//! - **[`io`]**: Side-effecting operations (scaffolding, config, the ward
//!   document on disk).
//!
//! [`ward::Ward`] coordinates the two: it serializes writers per patient,
//! reads the injected [`clock::Clock`] and persists after every transition.

pub mod clock;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod patient;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod triage_state;
pub mod ward;
