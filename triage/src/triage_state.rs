use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::answers::{StepOneAnswers, StepThreeAnswers, StepTwoAnswers};
use crate::core::checklist::checklist_for;
use crate::core::types::{Priority, TriagePhase};

/// Final classification step; it always resolves.
pub const LAST_STEP: u8 = 3;

/// Classification and action-phase state for one patient.
///
/// Mutated only through the transitions in [`crate::core::state_update`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TriageState {
    pub step: u8,
    pub step1: StepOneAnswers,
    pub step2: StepTwoAnswers,
    pub step3: StepThreeAnswers,
    pub priority: Priority,
    pub step_started_at: DateTime<Utc>,
    pub step1_completed_at: Option<DateTime<Utc>>,
    pub step2_completed_at: Option<DateTime<Utc>>,
    pub step3_completed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub timer_active: bool,
    pub actions_started_at: Option<DateTime<Utc>>,
    pub actions_data: BTreeMap<String, DateTime<Utc>>,
    pub brigade_called_at: Option<DateTime<Utc>>,
    pub actions_completed_at: Option<DateTime<Utc>>,
}

impl TriageState {
    /// Fresh triage at patient registration: step 1 countdown running.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            step: 1,
            step1: StepOneAnswers::default(),
            step2: StepTwoAnswers::default(),
            step3: StepThreeAnswers::default(),
            priority: Priority::Pending,
            step_started_at: now,
            step1_completed_at: None,
            step2_completed_at: None,
            step3_completed_at: None,
            completed_at: None,
            timer_active: true,
            actions_started_at: None,
            actions_data: BTreeMap::new(),
            brigade_called_at: None,
            actions_completed_at: None,
        }
    }

    pub fn phase(&self) -> TriagePhase {
        if self.actions_completed_at.is_some() {
            return TriagePhase::ActionsComplete;
        }
        if self.completed_at.is_some() {
            return if self.actions_data.is_empty() {
                TriagePhase::PriorityAssigned
            } else {
                TriagePhase::ActionsInProgress
            };
        }
        match self.step {
            1 => TriagePhase::Step1Active,
            2 => TriagePhase::Step2Active,
            _ => TriagePhase::Step3Active,
        }
    }

    /// Action phase running and not yet confirmed complete.
    pub fn is_in_actions(&self) -> bool {
        self.actions_started_at.is_some() && self.actions_completed_at.is_none()
    }

    /// Shown on the live display: classification running or actions pending.
    pub fn is_active(&self) -> bool {
        self.timer_active || self.is_in_actions()
    }

    pub fn step_name(&self) -> &'static str {
        step_name(self.step)
    }

    pub fn step_completed_at(&self, step: u8) -> Option<DateTime<Utc>> {
        match step {
            1 => self.step1_completed_at,
            2 => self.step2_completed_at,
            3 => self.step3_completed_at,
            _ => None,
        }
    }

    pub(crate) fn set_step_completed_at(&mut self, step: u8, at: Option<DateTime<Utc>>) {
        match step {
            1 => self.step1_completed_at = at,
            2 => self.step2_completed_at = at,
            3 => self.step3_completed_at = at,
            _ => {}
        }
    }

    /// Number of checklist actions for the current priority.
    pub fn actions_total(&self) -> usize {
        checklist_for(self.priority).len()
    }

    /// Number of checklist actions currently marked.
    pub fn actions_completed(&self) -> usize {
        checklist_for(self.priority)
            .iter()
            .filter(|a| self.actions_data.contains_key(a.key))
            .count()
    }
}

pub fn step_name(step: u8) -> &'static str {
    match step {
        1 => "Level of consciousness",
        2 => "Mobility and history",
        3 => "Vital signs",
        _ => "Unknown step",
    }
}
