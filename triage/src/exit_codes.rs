//! Stable exit codes for triage CLI commands.

/// Command succeeded; for `triage overdue`, no step timer has expired.
pub const OK: i32 = 0;
/// Command failed due to invalid layout/config/ward or other errors.
pub const INVALID: i32 = 1;
/// `triage overdue` found at least one running step timer at zero.
pub const OVERDUE: i32 = 2;
