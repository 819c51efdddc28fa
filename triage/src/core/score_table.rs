//! Consciousness score tables (eye, verbal, motor responses).
//!
//! Answer text maps to a sub-score; unknown or missing answers score 0.

use crate::core::answers::StepOneAnswers;

pub const EYE_OPENING_SCORES: &[(&str, u8)] = &[
    ("opens spontaneously", 4),
    ("eyes closed", 3),
    ("opens to voice", 3),
    ("opens to pain", 2),
    ("eyes closed, no response", 1),
];

pub const VERBAL_SCORES: &[(&str, u8)] = &[
    ("oriented, answers promptly", 4),
    ("confused, slurred speech", 3),
    ("incoherent words", 2),
    ("no response", 1),
];

pub const MOTOR_SCORES: &[(&str, u8)] = &[
    ("obeys commands", 6),
    ("withdraws from pain", 5),
    ("limb jerks to pain", 4),
    ("abnormal flexion", 3),
    ("abnormal extension", 2),
    ("no movement", 1),
];

pub fn eye_score(answers: &StepOneAnswers) -> u8 {
    lookup(EYE_OPENING_SCORES, answers.eye_opening.as_deref())
}

pub fn verbal_score(answers: &StepOneAnswers) -> u8 {
    lookup(VERBAL_SCORES, answers.verbal_response.as_deref())
}

pub fn motor_score(answers: &StepOneAnswers) -> u8 {
    lookup(MOTOR_SCORES, answers.motor_response.as_deref())
}

/// Sum of the three sub-scores (3..=14 when all answered, 0 when none are).
pub fn consciousness_score(answers: &StepOneAnswers) -> u8 {
    eye_score(answers) + verbal_score(answers) + motor_score(answers)
}

fn lookup(table: &[(&str, u8)], answer: Option<&str>) -> u8 {
    answer
        .and_then(|text| table.iter().find(|(label, _)| *label == text))
        .map_or(0, |(_, score)| *score)
}
