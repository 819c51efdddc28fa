use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the patient arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealType {
    /// Planned hospitalization by referral.
    PlannedReferral,
    SelfReferral,
    Ambulance,
    DiagnosticCenter,
}

impl AppealType {
    pub fn as_str(self) -> &'static str {
        match self {
            AppealType::PlannedReferral => "planned_referral",
            AppealType::SelfReferral => "self_referral",
            AppealType::Ambulance => "ambulance",
            AppealType::DiagnosticCenter => "diagnostic_center",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: u64,
    pub full_name: String,
    pub admission_date: NaiveDate,
    pub admission_time: NaiveTime,
    pub birth_date: NaiveDate,
    pub performer_name: String,
    pub appeal_type: AppealType,
    pub pregnancy_weeks: Option<f64>,
    pub pregnancy_unknown: bool,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn pregnancy_display(&self) -> String {
        if self.pregnancy_unknown {
            return "unknown".to_string();
        }
        match self.pregnancy_weeks {
            Some(weeks) => format!("{weeks} weeks"),
            None => "not specified".to_string(),
        }
    }

    /// Admission time as `HH:MM`.
    pub fn admission_time_formatted(&self) -> String {
        self.admission_time.format("%H:%M").to_string()
    }
}

/// Registration form for a new patient.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub full_name: String,
    pub admission_date: NaiveDate,
    pub admission_time: NaiveTime,
    pub birth_date: NaiveDate,
    pub performer_name: String,
    pub appeal_type: AppealType,
    #[serde(default)]
    pub pregnancy_weeks: Option<f64>,
    #[serde(default)]
    pub pregnancy_unknown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid patient: {}", .0.join("; "))]
pub struct PatientValidationError(pub Vec<String>);

impl NewPatient {
    pub fn validate(&self) -> Result<(), PatientValidationError> {
        let mut errors = Vec::new();
        if self.full_name.trim().is_empty() {
            errors.push("full_name must not be blank".to_string());
        }
        if self.performer_name.trim().is_empty() {
            errors.push("performer_name must not be blank".to_string());
        }
        if let Some(weeks) = self.pregnancy_weeks
            && !(0.0..=45.0).contains(&weeks)
        {
            errors.push(format!("pregnancy_weeks {weeks} is out of range"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PatientValidationError(errors))
        }
    }

    /// Build the stored patient. A known-unknown pregnancy drops the week count.
    pub fn into_patient(self, id: u64, created_at: DateTime<Utc>) -> Patient {
        let pregnancy_weeks = if self.pregnancy_unknown {
            None
        } else {
            self.pregnancy_weeks
        };
        Patient {
            id,
            full_name: self.full_name.trim().to_string(),
            admission_date: self.admission_date,
            admission_time: self.admission_time,
            birth_date: self.birth_date,
            performer_name: self.performer_name.trim().to_string(),
            appeal_type: self.appeal_type,
            pregnancy_weeks,
            pregnancy_unknown: self.pregnancy_unknown,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_patient, t0};

    #[test]
    fn blank_names_are_rejected() {
        let mut form = new_patient("  ");
        form.performer_name = String::new();
        let err = form.validate().expect_err("blank");
        assert_eq!(err.0.len(), 2);
        assert!(err.to_string().starts_with("invalid patient: full_name"));
    }

    #[test]
    fn pregnancy_display_variants() {
        let mut patient = new_patient("Anna Petrova").into_patient(1, t0());
        assert_eq!(patient.pregnancy_display(), "not specified");
        patient.pregnancy_weeks = Some(30.5);
        assert_eq!(patient.pregnancy_display(), "30.5 weeks");
        patient.pregnancy_unknown = true;
        assert_eq!(patient.pregnancy_display(), "unknown");
    }

    #[test]
    fn unknown_pregnancy_drops_weeks() {
        let mut form = new_patient("Anna Petrova");
        form.pregnancy_weeks = Some(20.0);
        form.pregnancy_unknown = true;
        let patient = form.into_patient(7, t0());
        assert_eq!(patient.id, 7);
        assert!(patient.pregnancy_weeks.is_none());
    }
}
