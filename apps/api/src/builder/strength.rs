//! CV strength meter — a 0–100 completeness heuristic shown while drafting.
//!
//! Purely informational: nothing gates on the number. Weights and label
//! thresholds are user-visible and must stay exactly as listed here.

use serde::{Deserialize, Serialize};

use crate::models::cv::CvData;

const FULL_NAME_POINTS: u8 = 10;
const EMAIL_POINTS: u8 = 5;
const PHONE_POINTS: u8 = 5;
const LOCATION_POINTS: u8 = 5;
const SUMMARY_POINTS: u8 = 15;
const FIRST_EXPERIENCE_POINTS: u8 = 20;
const EXTRA_EXPERIENCE_POINTS: u8 = 10;
const DETAILED_DESCRIPTION_POINTS: u8 = 10;
const EDUCATION_POINTS: u8 = 10;
const SKILLS_POINTS: u8 = 10;

/// Summary must be strictly longer than this (in chars, trimmed) to count.
const SUMMARY_MIN_CHARS: usize = 50;
/// At least one experience description must be strictly longer than this.
const DESCRIPTION_MIN_CHARS: usize = 30;
const MIN_SKILLS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLabel {
    Weak,
    Medium,
    Good,
    Excellent,
}

impl StrengthLabel {
    pub fn for_score(score: u8) -> Self {
        match score {
            s if s < 30 => StrengthLabel::Weak,
            s if s < 60 => StrengthLabel::Medium,
            s if s < 85 => StrengthLabel::Good,
            _ => StrengthLabel::Excellent,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrengthReport {
    pub score: u8,
    pub label: StrengthLabel,
}

impl StrengthReport {
    pub fn for_cv(cv: &CvData) -> Self {
        let score = score(cv);
        Self {
            score,
            label: StrengthLabel::for_score(score),
        }
    }
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

fn longer_than(value: &str, min_chars: usize) -> bool {
    value.trim().chars().count() > min_chars
}

/// Computes the strength score. The weights sum to exactly 100.
pub fn score(cv: &CvData) -> u8 {
    let mut score = 0;

    if filled(&cv.full_name) {
        score += FULL_NAME_POINTS;
    }
    if filled(&cv.email) {
        score += EMAIL_POINTS;
    }
    if filled(&cv.phone) {
        score += PHONE_POINTS;
    }
    if filled(&cv.location) {
        score += LOCATION_POINTS;
    }
    if longer_than(&cv.summary, SUMMARY_MIN_CHARS) {
        score += SUMMARY_POINTS;
    }
    if !cv.experiences.is_empty() {
        score += FIRST_EXPERIENCE_POINTS;
    }
    if cv.experiences.len() > 1 {
        score += EXTRA_EXPERIENCE_POINTS;
    }
    if cv
        .experiences
        .iter()
        .any(|e| longer_than(&e.description, DESCRIPTION_MIN_CHARS))
    {
        score += DETAILED_DESCRIPTION_POINTS;
    }
    if !cv.education.is_empty() {
        score += EDUCATION_POINTS;
    }
    if cv.skills.len() >= MIN_SKILLS {
        score += SKILLS_POINTS;
    }

    score
}
