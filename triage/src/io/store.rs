//! Ward document load/save with schema + invariant validation.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::config::write_atomic;
use crate::core::invariants::validate_invariants;
use crate::patient::Patient;
use crate::triage_state::TriageState;

pub(crate) const WARD_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/ward/v1.schema.json"
));

/// A patient stored together with their triage.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WardRecord {
    pub patient: Patient,
    pub triage: TriageState,
}

/// On-disk shape of `.triage/state/ward.json`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WardDocument {
    pub next_patient_id: u64,
    pub patients: Vec<WardRecord>,
}

impl Default for WardDocument {
    fn default() -> Self {
        Self {
            next_patient_id: 1,
            patients: Vec::new(),
        }
    }
}

/// Load and validate the ward from disk (schema + invariants).
pub fn load_ward(schema_path: &Path, ward_path: &Path) -> Result<WardDocument> {
    let contents = fs::read_to_string(ward_path)
        .with_context(|| format!("read ward {}", ward_path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse ward {}", ward_path.display()))?;
    validate_schema(schema_path, &value)?;
    let document: WardDocument = serde_json::from_value(value)
        .with_context(|| format!("deserialize ward {}", ward_path.display()))?;
    validate_ward_invariants(&document)?;
    debug!(
        path = %ward_path.display(),
        patients = document.patients.len(),
        "loaded ward"
    );
    Ok(document)
}

/// Write the ward pretty-printed, records ordered by patient id.
pub fn write_ward(ward_path: &Path, document: &WardDocument) -> Result<()> {
    let mut sorted = document.clone();
    sorted.patients.sort_by_key(|record| record.patient.id);
    let mut buf = serde_json::to_string_pretty(&sorted).context("serialize ward")?;
    buf.push('\n');
    write_atomic(ward_path, &buf)?;
    debug!(
        path = %ward_path.display(),
        patients = sorted.patients.len(),
        "wrote ward"
    );
    Ok(())
}

/// Cross-record invariants plus [`validate_invariants`] for every triage.
pub fn ward_invariant_errors(document: &WardDocument) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = BTreeSet::new();
    for record in &document.patients {
        let id = record.patient.id;
        if !seen.insert(id) {
            errors.push(format!("duplicate patient id {id}"));
        }
        if id >= document.next_patient_id {
            errors.push(format!(
                "patient id {id} is not below next_patient_id {}",
                document.next_patient_id
            ));
        }
        errors.extend(
            validate_invariants(&record.triage)
                .into_iter()
                .map(|err| format!("patient {id}: {err}")),
        );
    }
    errors
}

fn validate_schema(schema_path: &Path, ward: &Value) -> Result<()> {
    let schema_contents = fs::read_to_string(schema_path)
        .with_context(|| format!("read schema {}", schema_path.display()))?;
    let schema_value: Value = serde_json::from_str(&schema_contents)
        .with_context(|| format!("parse schema {}", schema_path.display()))?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(ward) {
        let messages = compiled
            .iter_errors(ward)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "ward schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

fn validate_ward_invariants(document: &WardDocument) -> Result<()> {
    let errors = ward_invariant_errors(document);
    if errors.is_empty() {
        return Ok(());
    }
    Err(anyhow!("ward invariants failed: {}", errors.join("; ")))
}
