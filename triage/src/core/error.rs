//! Failure kinds for triage transitions.
//!
//! All variants are deterministic validation failures: retrying the same call
//! against the same state fails the same way.

use thiserror::Error;

use crate::core::types::Priority;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriageError {
    #[error("no triage found for patient {0}")]
    NotFound(u64),
    #[error("invalid step: {0}")]
    InvalidStep(String),
    #[error("triage already completed with priority {0}")]
    AlreadyCompleted(Priority),
    #[error("triage is locked: all actions were completed")]
    EditLocked,
    #[error("action '{key}' is not on the {priority} checklist")]
    UnknownAction { key: String, priority: Priority },
    #[error("final action '{0}' cannot be unmarked after actions were completed")]
    FinalActionLocked(String),
    #[error("actions incomplete: {}", describe_missing(.missing))]
    IncompleteActions { missing: Vec<String> },
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl TriageError {
    /// Stable machine-readable kind for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            TriageError::NotFound(_) => "not_found",
            TriageError::InvalidStep(_) => "invalid_step",
            TriageError::AlreadyCompleted(_) => "already_completed",
            TriageError::EditLocked => "edit_locked",
            TriageError::UnknownAction { .. } => "unknown_action",
            TriageError::FinalActionLocked(_) => "final_action_locked",
            TriageError::IncompleteActions { .. } => "incomplete_actions",
            TriageError::InvariantViolation(_) => "invariant_violation",
        }
    }
}

fn describe_missing(missing: &[String]) -> String {
    if missing.is_empty() {
        return "classification is still running".to_string();
    }
    format!("missing {}", missing.join(", "))
}
