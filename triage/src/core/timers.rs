//! Countdowns derived from stored start instants and the current clock.
//!
//! Nothing here ticks: every value is recomputed on read, so results survive
//! restarts and never depend on when the previous read happened. Remaining
//! values are clamped to `0..=duration`.

use chrono::{DateTime, Duration, Utc};

use crate::core::checklist::timer_action;
use crate::triage_state::TriageState;

/// Per-step countdown lengths in seconds (steps 1, 2, 3).
pub const STEP_DURATIONS_SECS: [i64; 3] = [120, 300, 600];

/// Countdown for working the action checklist once a priority is assigned.
pub const ACTIONS_DURATION_SECS: i64 = 300;

pub fn step_duration_secs(step: u8) -> i64 {
    match step {
        1..=3 => STEP_DURATIONS_SECS[usize::from(step - 1)],
        _ => STEP_DURATIONS_SECS[0],
    }
}

/// Seconds left on the active step; 0 once classification finished.
pub fn step_time_remaining(state: &TriageState, now: DateTime<Utc>) -> i64 {
    if !state.timer_active {
        return 0;
    }
    remaining(step_duration_secs(state.step), state.step_started_at, now)
}

/// Absolute end of the active step countdown, for client-side countdowns.
pub fn step_timer_ends_at(state: &TriageState) -> Option<DateTime<Utc>> {
    state
        .timer_active
        .then(|| state.step_started_at + Duration::seconds(step_duration_secs(state.step)))
}

pub fn expired(state: &TriageState, now: DateTime<Utc>) -> bool {
    step_time_remaining(state, now) == 0
}

pub fn actions_time_remaining(state: &TriageState, now: DateTime<Utc>) -> Option<i64> {
    state
        .actions_started_at
        .map(|started| remaining(ACTIONS_DURATION_SECS, started, now))
}

pub fn actions_timer_ends_at(state: &TriageState) -> Option<DateTime<Utc>> {
    state
        .actions_started_at
        .map(|started| started + Duration::seconds(ACTIONS_DURATION_SECS))
}

/// Seconds left on the brigade/nurse/wait countdown, once its action was marked.
pub fn brigade_time_remaining(state: &TriageState, now: DateTime<Utc>) -> Option<i64> {
    let called = state.brigade_called_at?;
    Some(remaining(brigade_duration_secs(state)?, called, now))
}

pub fn brigade_timer_ends_at(state: &TriageState) -> Option<DateTime<Utc>> {
    let called = state.brigade_called_at?;
    Some(called + Duration::seconds(brigade_duration_secs(state)?))
}

fn brigade_duration_secs(state: &TriageState) -> Option<i64> {
    timer_action(state.priority)
        .and_then(|action| action.timer)
        .map(|timer| timer.duration_secs())
}

/// `duration - elapsed`, with elapsed floored at zero so a backwards clock
/// step never yields more than the full duration.
fn remaining(duration_secs: i64, started: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - started).num_seconds().max(0);
    (duration_secs - elapsed).max(0)
}
