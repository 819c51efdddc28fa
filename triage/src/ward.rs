//! In-process ward service: patients, their triage states and persistence.
//!
//! Each patient has its own writer lock. A writer clones the current state and
//! applies one transition from [`crate::core::state_update`]. The whole ward,
//! with the new state in place, is then written through
//! [`crate::io::store::write_ward`] under a store-wide lock, and the shared
//! `Arc` is swapped only once that write succeeds. Readers only clone the
//! `Arc`, so they never see a change that did not reach disk.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::clock::Clock;
use crate::core::answers::StepAnswers;
use crate::core::error::TriageError;
use crate::core::filter::PatientFilter;
use crate::core::snapshot::{
    ActionResponse, ActiveTriageRow, PatientListRow, TimerSnapshot, action_response, active_row,
    list_row, timer_snapshot,
};
use crate::core::state_update;
use crate::core::types::AdvanceOutcome;
use crate::io::init::TriagePaths;
use crate::io::store::{WardDocument, WardRecord, load_ward, write_ward};
use crate::patient::{NewPatient, Patient, PatientValidationError};
use crate::triage_state::TriageState;

/// Action name reported by [`Ward::complete_actions`].
pub const COMPLETE_ACTION: &str = "complete";

#[derive(Debug, Error)]
pub enum WardError {
    #[error(transparent)]
    Triage(#[from] TriageError),
    #[error(transparent)]
    InvalidPatient(#[from] PatientValidationError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl WardError {
    /// Stable snake_case identifier for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            WardError::Triage(err) => err.kind(),
            WardError::InvalidPatient(_) => "invalid_patient",
            WardError::Store(_) => "store",
        }
    }
}

/// Patient, triage and the display row computed at read time.
#[derive(Debug, Clone, Serialize)]
pub struct PatientDetail {
    pub patient: Patient,
    pub triage: TriageState,
    pub snapshot: ActiveTriageRow,
}

struct WardEntry {
    patient: Patient,
    writer: Mutex<()>,
    triage: RwLock<Arc<TriageState>>,
}

impl WardEntry {
    fn new(patient: Patient, triage: TriageState) -> Self {
        Self {
            patient,
            writer: Mutex::new(()),
            triage: RwLock::new(Arc::new(triage)),
        }
    }

    fn current(&self) -> Arc<TriageState> {
        let guard = self.triage.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }
}

pub struct Ward {
    ward_path: PathBuf,
    clock: Box<dyn Clock>,
    next_patient_id: AtomicU64,
    entries: RwLock<BTreeMap<u64, Arc<WardEntry>>>,
    persist_lock: Mutex<()>,
}

impl Ward {
    /// Load the ward under `paths` (schema + invariants checked).
    pub fn open(paths: &TriagePaths, clock: Box<dyn Clock>) -> Result<Self> {
        let document = load_ward(&paths.schema_path, &paths.ward_path)?;
        Ok(Self::from_document(document, paths.ward_path.clone(), clock))
    }

    fn from_document(document: WardDocument, ward_path: PathBuf, clock: Box<dyn Clock>) -> Self {
        let entries = document
            .patients
            .into_iter()
            .map(|record| {
                (
                    record.patient.id,
                    Arc::new(WardEntry::new(record.patient, record.triage)),
                )
            })
            .collect();
        Self {
            ward_path,
            clock,
            next_patient_id: AtomicU64::new(document.next_patient_id),
            entries: RwLock::new(entries),
            persist_lock: Mutex::new(()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Register a patient and start their triage at step 1.
    pub fn register(&self, form: NewPatient) -> Result<PatientDetail, WardError> {
        form.validate()?;
        let now = self.now();
        let id = self.next_patient_id.fetch_add(1, Ordering::SeqCst);
        let patient = form.into_patient(id, now);
        let triage = TriageState::new(now);
        let entry = Arc::new(WardEntry::new(patient.clone(), triage.clone()));
        self.persist(
            |records| {
                records.push(WardRecord {
                    patient: patient.clone(),
                    triage: triage.clone(),
                });
            },
            || {
                self.entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(id, entry);
            },
        )?;
        debug!(patient_id = id, "registered patient");
        Ok(PatientDetail {
            snapshot: active_row(&patient, &triage, now),
            patient,
            triage,
        })
    }

    /// Remove a patient together with their triage.
    pub fn delete(&self, id: u64) -> Result<(), WardError> {
        self.entry(id)?;
        self.persist(
            |records| records.retain(|record| record.patient.id != id),
            || {
                self.entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&id);
            },
        )?;
        debug!(patient_id = id, "deleted patient");
        Ok(())
    }

    pub fn get(&self, id: u64) -> Result<PatientDetail, WardError> {
        let entry = self.entry(id)?;
        let triage = entry.current();
        Ok(PatientDetail {
            snapshot: active_row(&entry.patient, &triage, self.now()),
            patient: entry.patient.clone(),
            triage: (*triage).clone(),
        })
    }

    pub fn triage(&self, id: u64) -> Result<Arc<TriageState>, WardError> {
        Ok(self.entry(id)?.current())
    }

    /// Filtered patient list: every running step timer first, then at most
    /// `limit` other patients, newest admission first.
    pub fn list(&self, filter: &PatientFilter, limit: usize) -> Vec<PatientListRow> {
        let now = self.now();
        let mut rows: Vec<(Patient, Arc<TriageState>)> = self
            .entries()
            .into_iter()
            .filter(|entry| filter.matches(&entry.patient))
            .map(|entry| (entry.patient.clone(), entry.current()))
            .collect();
        rows.sort_by(|(a, a_triage), (b, b_triage)| {
            b_triage
                .timer_active
                .cmp(&a_triage.timer_active)
                .then_with(|| {
                    (b.admission_date, b.admission_time).cmp(&(a.admission_date, a.admission_time))
                })
                .then_with(|| b.id.cmp(&a.id))
        });
        let running = rows.iter().take_while(|(_, triage)| triage.timer_active).count();
        rows.into_iter()
            .take(running.saturating_add(limit))
            .map(|(patient, triage)| list_row(&patient, &triage, now))
            .collect()
    }

    /// Submit the active step's answers and advance in one atomic transition.
    pub fn advance_triage(&self, id: u64, answers: StepAnswers) -> Result<AdvanceOutcome, WardError> {
        let (outcome, _) = self.mutate(id, |state, now| {
            state_update::submit_step(state, answers, now)?;
            state_update::advance(state, now)
        })?;
        debug!(patient_id = id, ?outcome, "advanced triage");
        Ok(outcome)
    }

    pub fn edit_triage_step(
        &self,
        id: u64,
        step: u8,
        answers: StepAnswers,
    ) -> Result<TriageState, WardError> {
        let (outcome, state) = self.mutate(id, |state, now| {
            state_update::edit_step(state, step, answers, now)
        })?;
        debug!(patient_id = id, step, ?outcome, "edited triage step");
        Ok((*state).clone())
    }

    pub fn mark_action(&self, id: u64, key: &str) -> Result<ActionResponse, WardError> {
        let ((), state) = self.mutate(id, |state, now| state_update::mark_action(state, key, now))?;
        Ok(action_response(&state, key))
    }

    pub fn unmark_action(&self, id: u64, key: &str) -> Result<ActionResponse, WardError> {
        let ((), state) = self.mutate(id, |state, _| state_update::unmark_action(state, key))?;
        Ok(action_response(&state, key))
    }

    pub fn complete_actions(&self, id: u64) -> Result<ActionResponse, WardError> {
        let ((), state) = self.mutate(id, state_update::complete_actions)?;
        Ok(action_response(&state, COMPLETE_ACTION))
    }

    pub fn timer(&self, id: u64) -> Result<TimerSnapshot, WardError> {
        let state = self.entry(id)?.current();
        Ok(timer_snapshot(&state, self.now()))
    }

    /// Display rows for every active triage, in patient id order.
    pub fn snapshot_all(&self) -> Vec<ActiveTriageRow> {
        let now = self.now();
        self.entries()
            .into_iter()
            .filter_map(|entry| {
                let state = entry.current();
                state
                    .is_active()
                    .then(|| active_row(&entry.patient, &state, now))
            })
            .collect()
    }

    fn entries(&self) -> Vec<Arc<WardEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn entry(&self, id: u64) -> Result<Arc<WardEntry>, TriageError> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(TriageError::NotFound(id))
    }

    fn mutate<T>(
        &self,
        id: u64,
        transition: impl FnOnce(&mut TriageState, DateTime<Utc>) -> Result<T, TriageError>,
    ) -> Result<(T, Arc<TriageState>), WardError> {
        let entry = self.entry(id)?;
        let _writer = entry.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = (*entry.current()).clone();
        let value = transition(&mut next, self.now()).inspect_err(|err| {
            if let TriageError::InvariantViolation(detail) = err {
                error!(patient_id = id, %detail, "triage invariant violated");
            }
        })?;
        let next = Arc::new(next);
        self.persist(
            |records| {
                if let Some(record) = records.iter_mut().find(|record| record.patient.id == id) {
                    record.triage = (*next).clone();
                }
            },
            || *entry.triage.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next),
        )?;
        Ok((value, next))
    }

    /// Write the ward with `edit` applied to the live records, then run `apply`
    /// while the store lock is still held. Nothing is applied if the write fails.
    fn persist(&self, edit: impl FnOnce(&mut Vec<WardRecord>), apply: impl FnOnce()) -> Result<()> {
        let _store = self.persist_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut patients: Vec<WardRecord> = self
            .entries()
            .into_iter()
            .map(|entry| WardRecord {
                patient: entry.patient.clone(),
                triage: (*entry.current()).clone(),
            })
            .collect();
        edit(&mut patients);
        let document = WardDocument {
            next_patient_id: self.next_patient_id.load(Ordering::SeqCst),
            patients,
        };
        write_ward(&self.ward_path, &document)?;
        apply();
        Ok(())
    }
}
