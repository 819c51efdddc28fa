//! Test-only helpers: a fixed epoch, a manual clock, answer and patient builders
//! and a ward in a scratch directory.

use std::collections::BTreeSet;
use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use tempfile::TempDir;

use crate::clock::Clock;
use crate::core::answers::{InfectionSign, Position, StepOneAnswers, StepThreeAnswers, StepTwoAnswers};
use crate::io::init::{InitOptions, TriagePaths, init_triage};
use crate::patient::{AppealType, NewPatient};
use crate::ward::Ward;

/// Fixed reference instant used across tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 8, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move forward (or backward, for negative values) by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Step 1 answers scoring 1 + 1 + 1 = 3.
pub fn red_consciousness() -> StepOneAnswers {
    StepOneAnswers {
        eye_opening: Some("eyes closed, no response".to_string()),
        verbal_response: Some("no response".to_string()),
        motor_response: Some("no movement".to_string()),
        breathing: Some(true),
        heartbeat: Some(true),
        seizures: Some(false),
        active_bleeding: Some(false),
    }
}

/// Step 1 answers scoring 4 + 4 + 6 = 14.
pub fn alert_consciousness() -> StepOneAnswers {
    StepOneAnswers {
        eye_opening: Some("opens spontaneously".to_string()),
        verbal_response: Some("oriented, answers promptly".to_string()),
        motor_response: Some("obeys commands".to_string()),
        breathing: Some(true),
        heartbeat: Some(true),
        seizures: Some(false),
        active_bleeding: Some(false),
    }
}

/// Free movement, nothing ticked: step 2 does not resolve.
pub fn mobile_no_flags() -> StepTwoAnswers {
    StepTwoAnswers {
        position: Some(Position::ActiveFreeMovement),
        urgency_criteria: Some(BTreeSet::new()),
        infection_signs: Some(BTreeSet::new()),
    }
}

/// Free movement with a single infection sign: resolves purple.
pub fn mobile_with_infection(sign: InfectionSign) -> StepTwoAnswers {
    StepTwoAnswers {
        infection_signs: Some(BTreeSet::from([sign])),
        ..mobile_no_flags()
    }
}

/// Vitals inside every band with a normal temperature: resolves green.
pub fn normal_vitals() -> StepThreeAnswers {
    StepThreeAnswers {
        respiratory_rate: Some(18),
        saturation: Some(97),
        systolic_bp: Some(120),
        diastolic_bp: Some(80),
        heart_rate: Some(72),
        temperature: Some(36.6),
    }
}

/// Valid registration form for `full_name`.
pub fn new_patient(full_name: &str) -> NewPatient {
    NewPatient {
        full_name: full_name.to_string(),
        admission_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap_or_default(),
        admission_time: NaiveTime::from_hms_opt(7, 45, 0).unwrap_or_default(),
        birth_date: NaiveDate::from_ymd_opt(1992, 6, 1).unwrap_or_default(),
        performer_name: "Nurse Kovaleva".to_string(),
        appeal_type: AppealType::SelfReferral,
        pregnancy_weeks: None,
        pregnancy_unknown: false,
    }
}

/// An initialized `.triage/` in a temp dir with a [`Ward`] on a manual clock at [`t0`].
pub struct TestWard {
    pub temp: TempDir,
    pub paths: TriagePaths,
    pub clock: ManualClock,
    ward: Ward,
}

impl TestWard {
    /// Panics if the scratch directory cannot be set up.
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_triage(temp.path(), &InitOptions { force: false }).expect("init");
        let clock = ManualClock::new(t0());
        let ward = Ward::open(&paths, Box::new(clock.clone())).expect("open ward");
        Self {
            temp,
            paths,
            clock,
            ward,
        }
    }

    /// Load a second ward from the persisted document, sharing the clock.
    pub fn reopen(&self) -> Ward {
        Ward::open(&self.paths, Box::new(self.clock.clone())).expect("reopen ward")
    }
}

impl Default for TestWard {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TestWard {
    type Target = Ward;

    fn deref(&self) -> &Ward {
        &self.ward
    }
}
