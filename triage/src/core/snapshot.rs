//! Serializable read models for displays and the action board.
//!
//! All times are Unix seconds: `*_ends_at` are absolute instants and
//! `*_remaining` are non-negative durations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::score_table::{consciousness_score, eye_score, motor_score, verbal_score};
use crate::core::state_update::{can_complete, can_complete_final};
use crate::core::timers::{
    actions_time_remaining, actions_timer_ends_at, brigade_time_remaining, brigade_timer_ends_at,
    expired, step_duration_secs, step_time_remaining, step_timer_ends_at,
};
use crate::core::types::Priority;
use crate::patient::Patient;
use crate::triage_state::TriageState;

/// Step countdown for a single patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub time_remaining: i64,
    pub expired: bool,
}

pub fn timer_snapshot(state: &TriageState, now: DateTime<Utc>) -> TimerSnapshot {
    TimerSnapshot {
        time_remaining: step_time_remaining(state, now),
        expired: expired(state, now),
    }
}

/// One row of the live waiting-room display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveTriageRow {
    pub id: u64,
    pub full_name: String,
    pub performer_name: String,
    pub step: u8,
    pub step_name: &'static str,
    pub priority: Priority,
    pub priority_name: &'static str,
    pub time_remaining: i64,
    pub timer_ends_at: Option<i64>,
    pub eye_opening_score: u8,
    pub verbal_score: u8,
    pub motor_score: u8,
    pub consciousness_score: u8,
    pub is_in_actions: bool,
    pub actions_time_remaining: Option<i64>,
    pub actions_timer_ends_at: Option<i64>,
    pub brigade_time_remaining: Option<i64>,
    pub brigade_timer_ends_at: Option<i64>,
    pub actions_total: usize,
    pub actions_completed: usize,
}

pub fn active_row(patient: &Patient, state: &TriageState, now: DateTime<Utc>) -> ActiveTriageRow {
    ActiveTriageRow {
        id: patient.id,
        full_name: patient.full_name.clone(),
        performer_name: patient.performer_name.clone(),
        step: state.step,
        step_name: state.step_name(),
        priority: state.priority,
        priority_name: state.priority.display_name(),
        time_remaining: step_time_remaining(state, now),
        timer_ends_at: step_timer_ends_at(state).map(unix),
        eye_opening_score: eye_score(&state.step1),
        verbal_score: verbal_score(&state.step1),
        motor_score: motor_score(&state.step1),
        consciousness_score: consciousness_score(&state.step1),
        is_in_actions: state.is_in_actions(),
        actions_time_remaining: actions_time_remaining(state, now),
        actions_timer_ends_at: actions_timer_ends_at(state).map(unix),
        brigade_time_remaining: brigade_time_remaining(state, now),
        brigade_timer_ends_at: brigade_timer_ends_at(state).map(unix),
        actions_total: state.actions_total(),
        actions_completed: state.actions_completed(),
    }
}

/// Triage summary nested in patient list rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageSummary {
    pub step: u8,
    pub priority: Priority,
    pub priority_name: &'static str,
    pub completed_at: Option<DateTime<Utc>>,
    pub timer_active: bool,
    pub time_remaining: i64,
    pub timer_ends_at: Option<i64>,
    pub expired: bool,
    pub max_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientListRow {
    pub id: u64,
    pub full_name: String,
    pub admission_date: String,
    pub admission_time: String,
    pub performer_name: String,
    pub appeal_type: &'static str,
    pub pregnancy_display: String,
    pub created_at: String,
    pub triage: TriageSummary,
}

pub fn list_row(patient: &Patient, state: &TriageState, now: DateTime<Utc>) -> PatientListRow {
    PatientListRow {
        id: patient.id,
        full_name: patient.full_name.clone(),
        admission_date: patient.admission_date.to_string(),
        admission_time: patient.admission_time_formatted(),
        performer_name: patient.performer_name.clone(),
        appeal_type: patient.appeal_type.as_str(),
        pregnancy_display: patient.pregnancy_display(),
        created_at: patient.created_at.format("%d.%m.%Y %H:%M").to_string(),
        triage: TriageSummary {
            step: state.step,
            priority: state.priority,
            priority_name: state.priority.display_name(),
            completed_at: state.completed_at,
            timer_active: state.timer_active,
            time_remaining: step_time_remaining(state, now),
            timer_ends_at: step_timer_ends_at(state).map(unix),
            expired: expired(state, now),
            max_time: step_duration_secs(state.step),
        },
    }
}

/// Action-board response after marking, unmarking or completing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub action: String,
    pub can_complete_final: bool,
    pub can_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brigade_timer_ends_at: Option<i64>,
}

pub fn action_response(state: &TriageState, action: &str) -> ActionResponse {
    ActionResponse {
        success: true,
        action: action.to_string(),
        can_complete_final: can_complete_final(state),
        can_complete: can_complete(state),
        brigade_timer_ends_at: brigade_timer_ends_at(state).map(unix),
    }
}

fn unix(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}
