//! Patient list search and filters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::patient::{AppealType, Patient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PregnancyBand {
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "less_12")]
    Less12,
    #[serde(rename = "12_28")]
    From12To28,
    #[serde(rename = "more_28")]
    More28,
}

impl PregnancyBand {
    pub fn matches(self, patient: &Patient) -> bool {
        if self == PregnancyBand::Unknown {
            return patient.pregnancy_unknown;
        }
        if patient.pregnancy_unknown {
            return false;
        }
        let Some(weeks) = patient.pregnancy_weeks else {
            return false;
        };
        match self {
            PregnancyBand::Less12 => weeks < 12.0,
            PregnancyBand::From12To28 => (12.0..=28.0).contains(&weeks),
            PregnancyBand::More28 => weeks > 28.0,
            PregnancyBand::Unknown => false,
        }
    }
}

/// All criteria are optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientFilter {
    /// Substring of name or performer, or the patient id.
    pub search: Option<String>,
    pub admission_date: Option<NaiveDate>,
    pub appeal_type: Option<AppealType>,
    pub pregnancy_condition: Option<PregnancyBand>,
    /// Substring of the performer name.
    pub performer_filter: Option<String>,
}

impl PatientFilter {
    pub fn matches(&self, patient: &Patient) -> bool {
        if let Some(query) = non_blank(self.search.as_deref())
            && !matches_search(patient, query)
        {
            return false;
        }
        if let Some(date) = self.admission_date
            && patient.admission_date != date
        {
            return false;
        }
        if let Some(appeal) = self.appeal_type
            && patient.appeal_type != appeal
        {
            return false;
        }
        if let Some(band) = self.pregnancy_condition
            && !band.matches(patient)
        {
            return false;
        }
        if let Some(performer) = non_blank(self.performer_filter.as_deref())
            && !contains_ignore_case(&patient.performer_name, performer)
        {
            return false;
        }
        true
    }
}

fn matches_search(patient: &Patient, query: &str) -> bool {
    contains_ignore_case(&patient.full_name, query)
        || contains_ignore_case(&patient.performer_name, query)
        || patient.id.to_string().contains(query)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
