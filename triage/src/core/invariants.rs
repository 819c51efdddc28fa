//! Semantic invariants of a triage state not expressible via JSON Schema.

use crate::core::checklist::{checklist_for, find_action, timer_action};
use crate::triage_state::{LAST_STEP, TriageState};

/// Check cross-field consistency of one triage state:
/// - `step` within `1..=3`
/// - a priority is assigned exactly when classification completed
/// - the step timer runs exactly while classification is pending
/// - the action phase exists only for an assigned priority
/// - recorded actions belong to the priority's checklist
/// - the timer stamp tracks the timer action
/// - confirmed completion covers every action
/// - no step past the active one carries a completion stamp
pub fn validate_invariants(state: &TriageState) -> Vec<String> {
    let mut errors = Vec::new();

    if !(1..=LAST_STEP).contains(&state.step) {
        errors.push(format!("step {} is outside 1..={LAST_STEP}", state.step));
    }

    let classified = state.completed_at.is_some();
    if state.priority.is_assigned() != classified {
        errors.push(format!(
            "priority {} does not agree with completed_at {:?}",
            state.priority, state.completed_at
        ));
    }
    if state.timer_active == classified {
        errors.push(format!(
            "timer_active {} while completed_at is {:?}",
            state.timer_active, state.completed_at
        ));
    }
    if state.actions_started_at.is_some() != state.priority.is_assigned() {
        errors.push(format!(
            "actions_started_at {:?} with priority {}",
            state.actions_started_at, state.priority
        ));
    }

    for key in state.actions_data.keys() {
        if find_action(state.priority, key).is_none() {
            errors.push(format!(
                "action '{key}' is not on the {} checklist",
                state.priority
            ));
        }
    }

    let timer_marked =
        timer_action(state.priority).is_some_and(|a| state.actions_data.contains_key(a.key));
    if state.brigade_called_at.is_some() != timer_marked {
        errors.push(format!(
            "brigade_called_at {:?} does not match the timer action",
            state.brigade_called_at
        ));
    }

    if state.actions_completed_at.is_some() {
        let unmarked: Vec<&str> = checklist_for(state.priority)
            .iter()
            .filter(|a| !state.actions_data.contains_key(a.key))
            .map(|a| a.key)
            .collect();
        if !unmarked.is_empty() {
            errors.push(format!(
                "actions_completed_at set with unmarked actions: {}",
                unmarked.join(", ")
            ));
        }
    }

    for later in state.step.saturating_add(1)..=LAST_STEP {
        if state.step_completed_at(later).is_some() {
            errors.push(format!(
                "step {later} has a completion stamp but triage is at step {}",
                state.step
            ));
        }
    }

    errors
}
