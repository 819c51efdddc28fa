//! Per-priority action checklists.
//!
//! Each assigned priority has a fixed, ordered list of actions. Exactly one
//! action is final (it gates completion) and exactly one starts a secondary
//! countdown (brigade, nurse or wait timer).

use serde::{Deserialize, Serialize};

use crate::core::types::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Resuscitation brigade arrival.
    Brigade,
    /// Nurse arrival.
    Nurse,
    /// Waiting-room wait.
    Wait,
}

/// Secondary countdown started by marking an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionTimer {
    pub kind: TimerKind,
    pub minutes: u32,
}

impl ActionTimer {
    pub fn duration_secs(&self) -> i64 {
        i64::from(self.minutes) * 60
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorityAction {
    pub key: &'static str,
    pub label: &'static str,
    pub is_final: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<ActionTimer>,
}

const fn action(key: &'static str, label: &'static str) -> PriorityAction {
    PriorityAction {
        key,
        label,
        is_final: false,
        timer: None,
    }
}

const fn timed(
    key: &'static str,
    label: &'static str,
    kind: TimerKind,
    minutes: u32,
) -> PriorityAction {
    PriorityAction {
        key,
        label,
        is_final: false,
        timer: Some(ActionTimer { kind, minutes }),
    }
}

const fn final_step(key: &'static str, label: &'static str) -> PriorityAction {
    PriorityAction {
        key,
        label,
        is_final: true,
        timer: None,
    }
}

pub const RED_PRIORITY_ACTIONS: &[PriorityAction] = &[
    action("notify_senior_doctor", "Notify the senior doctor on duty"),
    timed(
        "brigade_called",
        "Call the resuscitation brigade",
        TimerKind::Brigade,
        12,
    ),
    action("move_to_resus_bay", "Move the patient to the resuscitation bay"),
    action("start_monitoring", "Start continuous vital-sign monitoring"),
    final_step("handover_to_brigade", "Hand the patient over to the brigade"),
];

pub const YELLOW_PRIORITY_ACTIONS: &[PriorityAction] = &[
    action("notify_duty_doctor", "Notify the doctor on duty"),
    timed("nurse_called", "Call the ward nurse", TimerKind::Nurse, 15),
    action("record_vitals", "Record vital signs in the chart"),
    action("place_in_observation", "Place the patient in the observation area"),
    final_step("doctor_examined", "Patient examined by the doctor"),
];

pub const PURPLE_PRIORITY_ACTIONS: &[PriorityAction] = &[
    action("isolate_patient", "Separate the patient from the waiting area"),
    action("issue_mask", "Give the patient a mask"),
    timed("nurse_called", "Call the ward nurse", TimerKind::Nurse, 12),
    action("notify_epidemiologist", "Notify the epidemiologist"),
    final_step("transfer_to_isolation_box", "Transfer the patient to the isolation box"),
];

pub const GREEN_PRIORITY_ACTIONS: &[PriorityAction] = &[
    action("register_in_queue", "Register the patient in the queue"),
    action("explain_waiting_time", "Explain the expected waiting time"),
    timed("wait_started", "Start the waiting countdown", TimerKind::Wait, 15),
    action("offer_reassessment", "Ask the patient to report any worsening"),
    final_step("refer_to_admissions", "Refer the patient to admissions"),
];

/// Ordered checklist for `priority`; empty while pending.
pub fn checklist_for(priority: Priority) -> &'static [PriorityAction] {
    match priority {
        Priority::Pending => &[],
        Priority::Red => RED_PRIORITY_ACTIONS,
        Priority::Yellow => YELLOW_PRIORITY_ACTIONS,
        Priority::Purple => PURPLE_PRIORITY_ACTIONS,
        Priority::Green => GREEN_PRIORITY_ACTIONS,
    }
}

pub fn final_action(priority: Priority) -> Option<&'static PriorityAction> {
    checklist_for(priority).iter().find(|a| a.is_final)
}

pub fn timer_action(priority: Priority) -> Option<&'static PriorityAction> {
    checklist_for(priority).iter().find(|a| a.timer.is_some())
}

pub fn find_action(priority: Priority, key: &str) -> Option<&'static PriorityAction> {
    checklist_for(priority).iter().find(|a| a.key == key)
}
