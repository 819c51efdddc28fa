//! Shared deterministic types for triage core logic.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Triage outcome color, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Classification still running; no checklist applies yet.
    Pending,
    Red,
    Yellow,
    Purple,
    Green,
}

impl Priority {
    /// All assignable priorities in urgency order.
    pub const ASSIGNED: [Priority; 4] = [
        Priority::Red,
        Priority::Yellow,
        Priority::Purple,
        Priority::Green,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Pending => "pending",
            Priority::Red => "red",
            Priority::Yellow => "yellow",
            Priority::Purple => "purple",
            Priority::Green => "green",
        }
    }

    /// Human-readable label for displays.
    pub fn display_name(self) -> &'static str {
        match self {
            Priority::Pending => "not determined",
            Priority::Red => "Red",
            Priority::Yellow => "Yellow",
            Priority::Purple => "Purple",
            Priority::Green => "Green",
        }
    }

    pub fn is_assigned(self) -> bool {
        self != Priority::Pending
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse lifecycle phase derived from a triage's stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriagePhase {
    Step1Active,
    Step2Active,
    Step3Active,
    /// Priority assigned, no checklist action marked yet.
    PriorityAssigned,
    ActionsInProgress,
    ActionsComplete,
}

/// Result of advancing (or editing) the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// Classification finished; the action phase has started.
    PriorityAssigned { priority: Priority },
    /// Classification continues at `step` with a fresh countdown.
    StepAdvanced { step: u8 },
}
