//! Typed checklist answers for each classification step.
//!
//! Every field is optional: a submission only carries the fields the form
//! filled in, and [`merge`](StepOneAnswers::merge) overwrites just those.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Step 1: level of consciousness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepOneAnswers {
    pub eye_opening: Option<String>,
    pub verbal_response: Option<String>,
    pub motor_response: Option<String>,
    pub breathing: Option<bool>,
    pub heartbeat: Option<bool>,
    pub seizures: Option<bool>,
    pub active_bleeding: Option<bool>,
}

impl StepOneAnswers {
    pub fn merge(&mut self, update: StepOneAnswers) {
        merge_field(&mut self.eye_opening, update.eye_opening);
        merge_field(&mut self.verbal_response, update.verbal_response);
        merge_field(&mut self.motor_response, update.motor_response);
        merge_field(&mut self.breathing, update.breathing);
        merge_field(&mut self.heartbeat, update.heartbeat);
        merge_field(&mut self.seizures, update.seizures);
        merge_field(&mut self.active_bleeding, update.active_bleeding);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Active position, moves freely. The only position that does not escalate.
    ActiveFreeMovement,
    /// Crutches, walker or wheelchair.
    UsesMobilityAids,
    /// Unsteady gait, holds on to support, limps.
    UnsteadyGait,
    /// Half-bent, guarding the abdomen or lower back.
    GuardedPosture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyCriterion {
    AbdominalOrLowerBackPain,
    HeadacheOrDizziness,
    /// Loss of consciousness or seizures within the last day.
    LossOfConsciousnessOrSeizures,
    /// Blood pressure of 140/90 or higher within the last day.
    ElevatedBloodPressure,
    /// Bloody genital discharge within the last day.
    GenitalBleeding,
    AmnioticFluidLeak,
    ReducedFetalMovement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfectionSign {
    /// Temperature of 37.3 or higher over the last 7 days.
    ProlongedFever,
    /// Cough, runny nose or sore throat right now.
    RespiratorySymptoms,
    /// Vomiting or frequent loose stool over the last 3 days.
    VomitingOrDiarrhea,
    InfectiousContact,
    /// Rash appearing within 14 days.
    Rash,
    RespiratoryInfectionContact,
    IntestinalInfectionContact,
}

/// Step 2: mobility and history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepTwoAnswers {
    pub position: Option<Position>,
    pub urgency_criteria: Option<BTreeSet<UrgencyCriterion>>,
    pub infection_signs: Option<BTreeSet<InfectionSign>>,
}

impl StepTwoAnswers {
    pub fn merge(&mut self, update: StepTwoAnswers) {
        merge_field(&mut self.position, update.position);
        merge_field(&mut self.urgency_criteria, update.urgency_criteria);
        merge_field(&mut self.infection_signs, update.infection_signs);
    }

    pub fn has_urgency_criteria(&self) -> bool {
        self.urgency_criteria
            .as_ref()
            .is_some_and(|set| !set.is_empty())
    }

    pub fn has_infection_signs(&self) -> bool {
        self.infection_signs
            .as_ref()
            .is_some_and(|set| !set.is_empty())
    }
}

/// Step 3: vital signs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepThreeAnswers {
    pub respiratory_rate: Option<i32>,
    pub saturation: Option<i32>,
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub heart_rate: Option<i32>,
    pub temperature: Option<f64>,
}

impl StepThreeAnswers {
    pub fn merge(&mut self, update: StepThreeAnswers) {
        merge_field(&mut self.respiratory_rate, update.respiratory_rate);
        merge_field(&mut self.saturation, update.saturation);
        merge_field(&mut self.systolic_bp, update.systolic_bp);
        merge_field(&mut self.diastolic_bp, update.diastolic_bp);
        merge_field(&mut self.heart_rate, update.heart_rate);
        merge_field(&mut self.temperature, update.temperature);
    }
}

/// A submission for exactly one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAnswers {
    One(StepOneAnswers),
    Two(StepTwoAnswers),
    Three(StepThreeAnswers),
}

impl StepAnswers {
    /// Step number (1..=3) this submission belongs to.
    pub fn step(&self) -> u8 {
        match self {
            StepAnswers::One(_) => 1,
            StepAnswers::Two(_) => 2,
            StepAnswers::Three(_) => 3,
        }
    }

    /// Decode a JSON form body for `step`.
    pub fn from_json(step: u8, value: serde_json::Value) -> Result<Self, String> {
        let parsed = match step {
            1 => serde_json::from_value(value).map(StepAnswers::One),
            2 => serde_json::from_value(value).map(StepAnswers::Two),
            3 => serde_json::from_value(value).map(StepAnswers::Three),
            other => return Err(format!("unknown step {other}")),
        };
        parsed.map_err(|err| format!("step {step} answers: {err}"))
    }
}

fn merge_field<T>(slot: &mut Option<T>, update: Option<T>) {
    if update.is_some() {
        *slot = update;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_keeps_fields_missing_from_update() {
        let mut answers = StepOneAnswers {
            eye_opening: Some("opens to voice".to_string()),
            breathing: Some(true),
            ..StepOneAnswers::default()
        };
        answers.merge(StepOneAnswers {
            motor_response: Some("obeys commands".to_string()),
            breathing: Some(false),
            ..StepOneAnswers::default()
        });

        assert_eq!(answers.eye_opening.as_deref(), Some("opens to voice"));
        assert_eq!(answers.motor_response.as_deref(), Some("obeys commands"));
        assert_eq!(answers.breathing, Some(false));
    }

    #[test]
    fn merge_replaces_whole_flag_sets() {
        let mut answers = StepTwoAnswers {
            urgency_criteria: Some(BTreeSet::from([UrgencyCriterion::HeadacheOrDizziness])),
            ..StepTwoAnswers::default()
        };
        answers.merge(StepTwoAnswers {
            urgency_criteria: Some(BTreeSet::new()),
            ..StepTwoAnswers::default()
        });
        assert!(!answers.has_urgency_criteria());
    }

    #[test]
    fn from_json_decodes_step_two_form() {
        let answers = StepAnswers::from_json(
            2,
            json!({
                "position": "unsteady_gait",
                "infection_signs": ["rash"]
            }),
        )
        .expect("decode");

        let StepAnswers::Two(two) = answers else {
            panic!("expected step two answers");
        };
        assert_eq!(two.position, Some(Position::UnsteadyGait));
        assert!(two.has_infection_signs());
        assert!(two.urgency_criteria.is_none());
    }

    #[test]
    fn from_json_rejects_unknown_step_and_bad_fields() {
        assert!(StepAnswers::from_json(4, json!({})).is_err());
        let err = StepAnswers::from_json(3, json!({"heart_rate": "fast"})).expect_err("bad type");
        assert!(err.contains("step 3"));
    }
}
