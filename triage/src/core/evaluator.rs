//! Per-step priority rules.
//!
//! Each evaluator is a pure function of one step's answers. `None` means the
//! step does not resolve and classification moves on to the next step. Step 3
//! is terminal and always resolves.

use crate::core::answers::{Position, StepOneAnswers, StepThreeAnswers, StepTwoAnswers};
use crate::core::score_table::consciousness_score;
use crate::core::types::Priority;

/// Consciousness totals at or below this value are `red`.
pub const RED_CONSCIOUSNESS_THRESHOLD: u8 = 8;

/// Temperatures at or above this value are `purple` when vitals are otherwise normal.
pub const PURPLE_TEMPERATURE_THRESHOLD: f64 = 37.5;

/// Vital sign outside its normal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbnormalVital {
    RespiratoryRate,
    Saturation,
    SystolicBp,
    DiastolicBp,
    HeartRate,
}

pub fn evaluate_step_one(answers: &StepOneAnswers) -> Option<Priority> {
    (consciousness_score(answers) <= RED_CONSCIOUSNESS_THRESHOLD).then_some(Priority::Red)
}

/// Yellow strictly dominates purple: any non-free position or urgency criterion
/// wins before infection signs are considered.
pub fn evaluate_step_two(answers: &StepTwoAnswers) -> Option<Priority> {
    let fully_mobile = answers.position == Some(Position::ActiveFreeMovement);
    if !fully_mobile || answers.has_urgency_criteria() {
        return Some(Priority::Yellow);
    }
    if answers.has_infection_signs() {
        return Some(Priority::Purple);
    }
    None
}

/// Yellow > purple > green. Missing vitals read as zero.
pub fn evaluate_step_three(answers: &StepThreeAnswers) -> Option<Priority> {
    if !abnormal_vitals(answers).is_empty() {
        return Some(Priority::Yellow);
    }
    if answers.temperature.unwrap_or(0.0) >= PURPLE_TEMPERATURE_THRESHOLD {
        return Some(Priority::Purple);
    }
    Some(Priority::Green)
}

/// Vitals outside their normal bands, in a fixed order.
pub fn abnormal_vitals(answers: &StepThreeAnswers) -> Vec<AbnormalVital> {
    let respiratory_rate = answers.respiratory_rate.unwrap_or(0);
    let saturation = answers.saturation.unwrap_or(0);
    let systolic = answers.systolic_bp.unwrap_or(0);
    let diastolic = answers.diastolic_bp.unwrap_or(0);
    let heart_rate = answers.heart_rate.unwrap_or(0);

    let mut flags = Vec::new();
    if !(16..=24).contains(&respiratory_rate) {
        flags.push(AbnormalVital::RespiratoryRate);
    }
    if saturation < 93 {
        flags.push(AbnormalVital::Saturation);
    }
    if systolic >= 140 {
        flags.push(AbnormalVital::SystolicBp);
    }
    if diastolic >= 90 {
        flags.push(AbnormalVital::DiastolicBp);
    }
    if !(50..=110).contains(&heart_rate) {
        flags.push(AbnormalVital::HeartRate);
    }
    flags
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::core::answers::{InfectionSign, UrgencyCriterion};
    use crate::core::score_table::{EYE_OPENING_SCORES, MOTOR_SCORES, VERBAL_SCORES};

    fn normal_vitals() -> StepThreeAnswers {
        StepThreeAnswers {
            respiratory_rate: Some(20),
            saturation: Some(98),
            systolic_bp: Some(120),
            diastolic_bp: Some(80),
            heart_rate: Some(70),
            temperature: Some(36.6),
        }
    }

    fn step_two(
        position: Position,
        urgency: &[UrgencyCriterion],
        infection: &[InfectionSign],
    ) -> StepTwoAnswers {
        StepTwoAnswers {
            position: Some(position),
            urgency_criteria: Some(urgency.iter().copied().collect::<BTreeSet<_>>()),
            infection_signs: Some(infection.iter().copied().collect::<BTreeSet<_>>()),
        }
    }

    /// Exhaustive over every table combination: red exactly when total <= 8.
    #[test]
    fn step_one_red_iff_total_at_most_eight() {
        for (eye, eye_pts) in EYE_OPENING_SCORES {
            for (verbal, verbal_pts) in VERBAL_SCORES {
                for (motor, motor_pts) in MOTOR_SCORES {
                    let answers = StepOneAnswers {
                        eye_opening: Some(eye.to_string()),
                        verbal_response: Some(verbal.to_string()),
                        motor_response: Some(motor.to_string()),
                        ..StepOneAnswers::default()
                    };
                    let total = eye_pts + verbal_pts + motor_pts;
                    let expected = (total <= 8).then_some(Priority::Red);
                    assert_eq!(evaluate_step_one(&answers), expected, "total {total}");
                }
            }
        }
    }

    #[test]
    fn step_one_empty_answers_are_red() {
        assert_eq!(
            evaluate_step_one(&StepOneAnswers::default()),
            Some(Priority::Red)
        );
    }

    #[test]
    fn step_two_non_mobile_position_is_yellow_even_with_infection() {
        let answers = step_two(
            Position::GuardedPosture,
            &[],
            &[InfectionSign::RespiratorySymptoms],
        );
        assert_eq!(evaluate_step_two(&answers), Some(Priority::Yellow));
    }

    #[test]
    fn step_two_urgency_dominates_infection() {
        let answers = step_two(
            Position::ActiveFreeMovement,
            &[UrgencyCriterion::ReducedFetalMovement],
            &[InfectionSign::Rash],
        );
        assert_eq!(evaluate_step_two(&answers), Some(Priority::Yellow));
    }

    #[test]
    fn step_two_infection_only_is_purple() {
        let answers = step_two(
            Position::ActiveFreeMovement,
            &[],
            &[InfectionSign::VomitingOrDiarrhea],
        );
        assert_eq!(evaluate_step_two(&answers), Some(Priority::Purple));
    }

    #[test]
    fn step_two_all_clear_is_unresolved() {
        let answers = step_two(Position::ActiveFreeMovement, &[], &[]);
        assert_eq!(evaluate_step_two(&answers), None);
    }

    #[test]
    fn step_two_missing_position_is_yellow() {
        assert_eq!(
            evaluate_step_two(&StepTwoAnswers::default()),
            Some(Priority::Yellow)
        );
    }

    #[test]
    fn step_two_every_position_and_flag_combination() {
        let positions = [
            Position::ActiveFreeMovement,
            Position::UsesMobilityAids,
            Position::UnsteadyGait,
            Position::GuardedPosture,
        ];
        for position in positions {
            for urgent in [false, true] {
                for infected in [false, true] {
                    let urgency: &[UrgencyCriterion] = if urgent {
                        &[UrgencyCriterion::AmnioticFluidLeak]
                    } else {
                        &[]
                    };
                    let infection: &[InfectionSign] = if infected {
                        &[InfectionSign::ProlongedFever]
                    } else {
                        &[]
                    };
                    let got = evaluate_step_two(&step_two(position, urgency, infection));
                    let expected = if position != Position::ActiveFreeMovement || urgent {
                        Some(Priority::Yellow)
                    } else if infected {
                        Some(Priority::Purple)
                    } else {
                        None
                    };
                    assert_eq!(got, expected, "{position:?} urgent={urgent} infected={infected}");
                }
            }
        }
    }

    #[test]
    fn step_three_normal_vitals_are_green() {
        assert_eq!(
            evaluate_step_three(&normal_vitals()),
            Some(Priority::Green)
        );
    }

    #[test]
    fn step_three_fever_is_purple() {
        let vitals = StepThreeAnswers {
            temperature: Some(37.5),
            ..normal_vitals()
        };
        assert_eq!(evaluate_step_three(&vitals), Some(Priority::Purple));
    }

    #[test]
    fn step_three_yellow_dominates_fever() {
        let vitals = StepThreeAnswers {
            heart_rate: Some(120),
            temperature: Some(39.0),
            ..normal_vitals()
        };
        assert_eq!(evaluate_step_three(&vitals), Some(Priority::Yellow));
    }

    #[test]
    fn step_three_band_edges() {
        let cases = [
            (StepThreeAnswers { respiratory_rate: Some(24), ..normal_vitals() }, Priority::Green),
            (StepThreeAnswers { respiratory_rate: Some(25), ..normal_vitals() }, Priority::Yellow),
            (StepThreeAnswers { respiratory_rate: Some(16), ..normal_vitals() }, Priority::Green),
            (StepThreeAnswers { respiratory_rate: Some(15), ..normal_vitals() }, Priority::Yellow),
            (StepThreeAnswers { saturation: Some(93), ..normal_vitals() }, Priority::Green),
            (StepThreeAnswers { saturation: Some(92), ..normal_vitals() }, Priority::Yellow),
            (StepThreeAnswers { systolic_bp: Some(139), ..normal_vitals() }, Priority::Green),
            (StepThreeAnswers { systolic_bp: Some(140), ..normal_vitals() }, Priority::Yellow),
            (StepThreeAnswers { diastolic_bp: Some(89), ..normal_vitals() }, Priority::Green),
            (StepThreeAnswers { diastolic_bp: Some(90), ..normal_vitals() }, Priority::Yellow),
            (StepThreeAnswers { heart_rate: Some(110), ..normal_vitals() }, Priority::Green),
            (StepThreeAnswers { heart_rate: Some(111), ..normal_vitals() }, Priority::Yellow),
            (StepThreeAnswers { heart_rate: Some(50), ..normal_vitals() }, Priority::Green),
            (StepThreeAnswers { heart_rate: Some(49), ..normal_vitals() }, Priority::Yellow),
            (StepThreeAnswers { temperature: Some(37.4), ..normal_vitals() }, Priority::Green),
        ];
        for (vitals, expected) in cases {
            assert_eq!(evaluate_step_three(&vitals), Some(expected), "{vitals:?}");
        }
    }

    #[test]
    fn step_three_always_resolves() {
        assert!(evaluate_step_three(&StepThreeAnswers::default()).is_some());
        assert_eq!(
            abnormal_vitals(&StepThreeAnswers::default()),
            vec![
                AbnormalVital::RespiratoryRate,
                AbnormalVital::Saturation,
                AbnormalVital::HeartRate
            ]
        );
    }
}
