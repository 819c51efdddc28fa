//! End-to-end triage scenarios through the ward service.
//!
//! Each test registers patients in a scratch `.triage/`, drives them through
//! classification and the action checklist on a manual clock, and checks both
//! the in-memory state and what a freshly loaded ward sees on disk.

use std::collections::BTreeSet;

use triage::core::answers::{InfectionSign, StepAnswers, StepThreeAnswers, StepTwoAnswers, UrgencyCriterion};
use triage::core::checklist::{GREEN_PRIORITY_ACTIONS, RED_PRIORITY_ACTIONS, checklist_for};
use triage::core::filter::{PatientFilter, PregnancyBand};
use triage::core::types::{AdvanceOutcome, Priority, TriagePhase};
use triage::io::store::load_ward;
use triage::test_support::{
    TestWard, alert_consciousness, mobile_no_flags, mobile_with_infection, new_patient,
    normal_vitals, red_consciousness,
};

/// Red at step 1: actions start immediately and the brigade countdown starts
/// only when `brigade_called` is marked.
#[test]
fn red_patient_brigade_timer() {
    let ward = TestWard::new();
    let id = ward.register(new_patient("Anna Petrova")).expect("register").patient.id;

    ward.clock.advance_secs(45);
    let outcome = ward
        .advance_triage(id, StepAnswers::One(red_consciousness()))
        .expect("advance");
    assert_eq!(
        outcome,
        AdvanceOutcome::PriorityAssigned {
            priority: Priority::Red
        }
    );

    let state = ward.triage(id).expect("triage");
    assert_eq!(state.actions_started_at, Some(ward.now()));
    assert!(state.brigade_called_at.is_none());
    assert_eq!(state.actions_total(), RED_PRIORITY_ACTIONS.len());

    ward.clock.advance_secs(20);
    let response = ward.mark_action(id, "brigade_called").expect("mark");
    let called_at = ward.triage(id).expect("triage").brigade_called_at.expect("called");
    assert_eq!(response.brigade_timer_ends_at, Some(called_at.timestamp() + 720));

    let rows = ward.snapshot_all();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].consciousness_score, 3);
    assert_eq!(rows[0].brigade_time_remaining, Some(720));
    assert_eq!(rows[0].actions_time_remaining, Some(280));
}

/// Alert patient, free movement, normal vitals: green after all three steps,
/// then the full green checklist locks further edits.
#[test]
fn green_patient_full_lifecycle() {
    let ward = TestWard::new();
    let id = ward.register(new_patient("Boris Ivanov")).expect("register").patient.id;

    ward.clock.advance_secs(60);
    assert_eq!(
        ward.advance_triage(id, StepAnswers::One(alert_consciousness()))
            .expect("step 1"),
        AdvanceOutcome::StepAdvanced { step: 2 }
    );
    assert_eq!(ward.timer(id).expect("timer").time_remaining, 300);

    ward.clock.advance_secs(100);
    assert_eq!(
        ward.advance_triage(id, StepAnswers::Two(mobile_no_flags()))
            .expect("step 2"),
        AdvanceOutcome::StepAdvanced { step: 3 }
    );

    ward.clock.advance_secs(200);
    let vitals = StepThreeAnswers {
        respiratory_rate: Some(20),
        saturation: Some(98),
        systolic_bp: Some(120),
        diastolic_bp: Some(80),
        heart_rate: Some(70),
        temperature: Some(36.6),
    };
    assert_eq!(
        ward.advance_triage(id, StepAnswers::Three(vitals)).expect("step 3"),
        AdvanceOutcome::PriorityAssigned {
            priority: Priority::Green
        }
    );

    let timer = ward.timer(id).expect("timer");
    assert_eq!(timer.time_remaining, 0);
    assert!(timer.expired);

    let (final_action, others) = GREEN_PRIORITY_ACTIONS
        .split_last()
        .expect("non-empty checklist");
    assert!(final_action.is_final);
    for action in others {
        let response = ward.mark_action(id, action.key).expect("mark");
        assert!(!response.can_complete);
    }
    let err = ward.complete_actions(id).expect_err("final not marked");
    assert_eq!(err.kind(), "incomplete_actions");

    let response = ward.mark_action(id, final_action.key).expect("mark final");
    assert!(response.can_complete_final);
    assert!(response.can_complete);
    ward.complete_actions(id).expect("complete");

    let state = ward.triage(id).expect("triage");
    assert_eq!(state.phase(), TriagePhase::ActionsComplete);
    assert!(state.actions_completed_at.is_some());

    let err = ward
        .edit_triage_step(id, 3, StepAnswers::Three(normal_vitals()))
        .expect_err("locked");
    assert_eq!(err.kind(), "edit_locked");

    let reopened = ward.reopen();
    assert_eq!(*reopened.triage(id).expect("triage"), *state);
}

/// Editing step 1 of a red triage to an alert patient reopens classification
/// and wipes the action phase, on disk as well.
#[test]
fn edit_back_to_unresolved_clears_later_data() {
    let ward = TestWard::new();
    let id = ward.register(new_patient("Vera Smirnova")).expect("register").patient.id;
    ward.advance_triage(id, StepAnswers::One(red_consciousness()))
        .expect("advance");
    ward.mark_action(id, "brigade_called").expect("mark");

    ward.clock.advance_secs(30);
    let state = ward
        .edit_triage_step(id, 1, StepAnswers::One(alert_consciousness()))
        .expect("edit");

    assert_eq!(state.priority, Priority::Pending);
    assert_eq!(state.step, 2);
    assert!(state.timer_active);
    assert!(state.completed_at.is_none());
    assert!(state.actions_started_at.is_none());
    assert!(state.actions_data.is_empty());
    assert!(state.brigade_called_at.is_none());
    assert_eq!(state.step2, StepTwoAnswers::default());

    let document = load_ward(&ward.paths.schema_path, &ward.paths.ward_path).expect("load");
    assert_eq!(document.patients[0].triage, state);
}

/// Yellow strictly dominates purple at step 2.
#[test]
fn step_two_precedence() {
    let ward = TestWard::new();
    let purple = ward.register(new_patient("Purple")).expect("register").patient.id;
    let yellow = ward.register(new_patient("Yellow")).expect("register").patient.id;

    for id in [purple, yellow] {
        ward.advance_triage(id, StepAnswers::One(alert_consciousness()))
            .expect("step 1");
    }

    let outcome = ward
        .advance_triage(
            purple,
            StepAnswers::Two(mobile_with_infection(InfectionSign::RespiratorySymptoms)),
        )
        .expect("step 2");
    assert_eq!(
        outcome,
        AdvanceOutcome::PriorityAssigned {
            priority: Priority::Purple
        }
    );

    let both = StepTwoAnswers {
        urgency_criteria: Some(BTreeSet::from([UrgencyCriterion::HeadacheOrDizziness])),
        ..mobile_with_infection(InfectionSign::Rash)
    };
    let outcome = ward.advance_triage(yellow, StepAnswers::Two(both)).expect("step 2");
    assert_eq!(
        outcome,
        AdvanceOutcome::PriorityAssigned {
            priority: Priority::Yellow
        }
    );
}

/// A classified triage rejects further submissions without touching state.
#[test]
fn advance_after_classification_is_rejected() {
    let ward = TestWard::new();
    let id = ward.register(new_patient("Anna")).expect("register").patient.id;
    ward.advance_triage(id, StepAnswers::One(red_consciousness()))
        .expect("advance");
    let before = ward.triage(id).expect("triage");

    let err = ward
        .advance_triage(id, StepAnswers::One(alert_consciousness()))
        .expect_err("already classified");
    assert_eq!(err.kind(), "already_completed");
    assert_eq!(*ward.triage(id).expect("triage"), *before);

    let err = ward.mark_action(id, "nurse_called").expect_err("not on red list");
    assert_eq!(err.kind(), "unknown_action");
}

/// Marking twice keeps the first stamps.
#[test]
fn mark_action_is_idempotent_across_time() {
    let ward = TestWard::new();
    let id = ward.register(new_patient("Anna")).expect("register").patient.id;
    ward.advance_triage(id, StepAnswers::One(red_consciousness()))
        .expect("advance");

    ward.mark_action(id, "brigade_called").expect("mark");
    let first = ward.triage(id).expect("triage");
    ward.clock.advance_secs(90);
    ward.mark_action(id, "brigade_called").expect("mark again");
    let second = ward.triage(id).expect("triage");

    assert_eq!(first.actions_data, second.actions_data);
    assert_eq!(first.brigade_called_at, second.brigade_called_at);
}

/// The live snapshot only carries running classifications and open action phases.
#[test]
fn snapshot_lists_only_active_triages() {
    let ward = TestWard::new();
    let running = ward.register(new_patient("Running")).expect("register").patient.id;
    let done = ward.register(new_patient("Done")).expect("register").patient.id;
    ward.advance_triage(done, StepAnswers::One(red_consciousness()))
        .expect("advance");
    for action in checklist_for(Priority::Red) {
        ward.mark_action(done, action.key).expect("mark");
    }
    ward.complete_actions(done).expect("complete");

    let ids: Vec<u64> = ward.snapshot_all().iter().map(|row| row.id).collect();
    assert_eq!(ids, vec![running]);

    ward.delete(running).expect("delete");
    assert!(ward.snapshot_all().is_empty());
    assert!(ward.reopen().get(running).is_err());
}

#[test]
fn list_applies_filters_and_limit() {
    let ward = TestWard::new();
    let mut pregnant = new_patient("Olga Sidorova");
    pregnant.pregnancy_weeks = Some(30.0);
    pregnant.performer_name = "Dr. Orlov".to_string();
    let olga = ward.register(pregnant).expect("register").patient.id;
    ward.register(new_patient("Anna Petrova")).expect("register");

    let late = PatientFilter {
        pregnancy_condition: Some(PregnancyBand::More28),
        ..PatientFilter::default()
    };
    let rows = ward.list(&late, 10);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, olga);
    assert_eq!(rows[0].pregnancy_display, "30 weeks");

    let by_performer = PatientFilter {
        performer_filter: Some("orlov".to_string()),
        ..PatientFilter::default()
    };
    assert_eq!(ward.list(&by_performer, 10).len(), 1);
    assert_eq!(ward.list(&PatientFilter::default(), 0).len(), 2);
}
