//! Triage transitions: step submission, classification, edits and the action checklist.
//!
//! Every transition takes the current instant explicitly and either applies
//! fully or leaves the state untouched.

use chrono::{DateTime, Utc};

use crate::core::answers::StepAnswers;
use crate::core::checklist::{PriorityAction, checklist_for, find_action};
use crate::core::error::TriageError;
use crate::core::evaluator::{evaluate_step_one, evaluate_step_three, evaluate_step_two};
use crate::core::types::{AdvanceOutcome, Priority};
use crate::triage_state::{LAST_STEP, TriageState};

/// Merge `answers` into the active step and stamp its completion.
///
/// Only the currently active step may be submitted; corrections go through
/// [`edit_step`].
pub fn submit_step(
    state: &mut TriageState,
    answers: StepAnswers,
    now: DateTime<Utc>,
) -> Result<(), TriageError> {
    if state.completed_at.is_some() {
        return Err(TriageError::AlreadyCompleted(state.priority));
    }
    let submitted = answers.step();
    if submitted != state.step {
        return Err(TriageError::InvalidStep(format!(
            "step {submitted} submitted while step {} is active",
            state.step
        )));
    }
    merge_answers(state, answers);
    state.set_step_completed_at(submitted, Some(now));
    Ok(())
}

/// Evaluate the active step and either assign a priority or move to the next step.
pub fn advance(state: &mut TriageState, now: DateTime<Utc>) -> Result<AdvanceOutcome, TriageError> {
    if state.completed_at.is_some() {
        return Err(TriageError::AlreadyCompleted(state.priority));
    }
    let step = state.step;
    match evaluate_stored_step(state, step)? {
        Some(priority) => {
            finalize(state, priority, now);
            Ok(AdvanceOutcome::PriorityAssigned { priority })
        }
        None => {
            state.step = step + 1;
            state.step_started_at = now;
            Ok(AdvanceOutcome::StepAdvanced { step: state.step })
        }
    }
}

/// Correct an earlier (or the current) step and re-run classification from there.
///
/// Later steps are discarded. A resolving edit finalizes with a fresh action
/// phase; a non-resolving edit reopens classification at `step + 1`.
pub fn edit_step(
    state: &mut TriageState,
    step: u8,
    answers: StepAnswers,
    now: DateTime<Utc>,
) -> Result<AdvanceOutcome, TriageError> {
    if state.actions_completed_at.is_some() {
        return Err(TriageError::EditLocked);
    }
    if answers.step() != step {
        return Err(TriageError::InvalidStep(format!(
            "answers for step {} sent to step {step}",
            answers.step()
        )));
    }
    if step == 0 || step > state.step {
        return Err(TriageError::InvalidStep(format!(
            "cannot edit step {step}: triage reached step {}",
            state.step
        )));
    }

    let mut next = state.clone();
    merge_answers(&mut next, answers);
    next.set_step_completed_at(step, Some(now));
    clear_steps_after(&mut next, step);

    let outcome = match evaluate_stored_step(&next, step)? {
        Some(priority) => {
            next.step = step;
            finalize(&mut next, priority, now);
            AdvanceOutcome::PriorityAssigned { priority }
        }
        None => {
            reopen(&mut next, step + 1, now);
            AdvanceOutcome::StepAdvanced { step: next.step }
        }
    };
    *state = next;
    Ok(outcome)
}

/// Record `key` as done. Marking an already-marked action is a no-op.
///
/// The final action can only be marked once every other action is done.
pub fn mark_action(
    state: &mut TriageState,
    key: &str,
    now: DateTime<Utc>,
) -> Result<(), TriageError> {
    let action = checklist_action(state, key)?;
    if state.actions_data.contains_key(key) {
        return Ok(());
    }
    if action.is_final {
        let missing = missing_non_final(state);
        if !missing.is_empty() {
            return Err(TriageError::IncompleteActions { missing });
        }
    }
    state.actions_data.insert(key.to_string(), now);
    if action.timer.is_some() && state.brigade_called_at.is_none() {
        state.brigade_called_at = Some(now);
    }
    Ok(())
}

/// Remove the record for `key`; unmarking the timer action clears its countdown.
pub fn unmark_action(state: &mut TriageState, key: &str) -> Result<(), TriageError> {
    let action = checklist_action(state, key)?;
    if state.actions_completed_at.is_some() {
        return Err(if action.is_final {
            TriageError::FinalActionLocked(key.to_string())
        } else {
            TriageError::EditLocked
        });
    }
    if state.actions_data.remove(key).is_some() && action.timer.is_some() {
        state.brigade_called_at = None;
    }
    Ok(())
}

/// Confirm the checklist. Requires every action, final included, to be marked.
pub fn complete_actions(state: &mut TriageState, now: DateTime<Utc>) -> Result<(), TriageError> {
    if !state.priority.is_assigned() {
        return Err(TriageError::IncompleteActions {
            missing: Vec::new(),
        });
    }
    if state.actions_completed_at.is_some() {
        return Ok(());
    }
    let missing: Vec<String> = checklist_for(state.priority)
        .iter()
        .filter(|a| !state.actions_data.contains_key(a.key))
        .map(|a| a.key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(TriageError::IncompleteActions { missing });
    }
    state.actions_completed_at = Some(now);
    Ok(())
}

/// All non-final actions are marked, so the final action may be marked.
pub fn can_complete_final(state: &TriageState) -> bool {
    state.priority.is_assigned() && missing_non_final(state).is_empty()
}

/// The final action is marked too, so [`complete_actions`] would succeed.
pub fn can_complete(state: &TriageState) -> bool {
    can_complete_final(state)
        && checklist_for(state.priority)
            .iter()
            .filter(|a| a.is_final)
            .all(|a| state.actions_data.contains_key(a.key))
}

fn checklist_action(
    state: &TriageState,
    key: &str,
) -> Result<&'static PriorityAction, TriageError> {
    find_action(state.priority, key).ok_or_else(|| TriageError::UnknownAction {
        key: key.to_string(),
        priority: state.priority,
    })
}

fn missing_non_final(state: &TriageState) -> Vec<String> {
    checklist_for(state.priority)
        .iter()
        .filter(|a| !a.is_final && !state.actions_data.contains_key(a.key))
        .map(|a| a.key.to_string())
        .collect()
}

fn merge_answers(state: &mut TriageState, answers: StepAnswers) {
    match answers {
        StepAnswers::One(a) => state.step1.merge(a),
        StepAnswers::Two(a) => state.step2.merge(a),
        StepAnswers::Three(a) => state.step3.merge(a),
    }
}

fn evaluate_stored_step(state: &TriageState, step: u8) -> Result<Option<Priority>, TriageError> {
    let result = match step {
        1 => evaluate_step_one(&state.step1),
        2 => evaluate_step_two(&state.step2),
        3 => evaluate_step_three(&state.step3),
        other => {
            return Err(TriageError::InvariantViolation(format!(
                "step {other} is outside 1..={LAST_STEP}"
            )));
        }
    };
    if result.is_none() && step == LAST_STEP {
        return Err(TriageError::InvariantViolation(format!(
            "step {LAST_STEP} did not resolve a priority"
        )));
    }
    Ok(result)
}

fn finalize(state: &mut TriageState, priority: Priority, now: DateTime<Utc>) {
    state.priority = priority;
    state.completed_at = Some(now);
    state.timer_active = false;
    clear_action_phase(state);
    state.actions_started_at = Some(now);
}

fn reopen(state: &mut TriageState, step: u8, now: DateTime<Utc>) {
    state.priority = Priority::Pending;
    state.completed_at = None;
    state.timer_active = true;
    state.step = step;
    state.step_started_at = now;
    clear_action_phase(state);
}

fn clear_action_phase(state: &mut TriageState) {
    state.actions_started_at = None;
    state.actions_data.clear();
    state.brigade_called_at = None;
    state.actions_completed_at = None;
}

fn clear_steps_after(state: &mut TriageState, step: u8) {
    if step < 2 {
        state.step2 = Default::default();
    }
    if step < 3 {
        state.step3 = Default::default();
    }
    for later in (step + 1)..=LAST_STEP {
        state.set_step_completed_at(later, None);
    }
}
