//! CV wizard controller — five linear steps over one in-memory `CvData`.
//!
//! Steps never validate: users may move forward (and export) with empty
//! fields. The strength meter is the only feedback on completeness.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::builder::improve::ImproveKind;
use crate::builder::strength::StrengthReport;
use crate::errors::AppError;
use crate::models::cv::{
    CvData, CvEducation, CvExperience, EducationUpdate, ExperienceUpdate, FieldUpdate,
};
use crate::render::{render, Document, TemplateKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    PersonalInfo,
    Experience,
    Education,
    Skills,
    FinalSummary,
}

impl Step {
    const ORDER: [Step; 5] = [
        Step::PersonalInfo,
        Step::Experience,
        Step::Education,
        Step::Skills,
        Step::FinalSummary,
    ];

    /// 1-based position.
    pub fn number(&self) -> u8 {
        match self {
            Step::PersonalInfo => 1,
            Step::Experience => 2,
            Step::Education => 3,
            Step::Skills => 4,
            Step::FinalSummary => 5,
        }
    }

    fn from_number(n: u8) -> Self {
        Self::ORDER[(n.clamp(1, 5) - 1) as usize]
    }

    pub fn can_advance(&self) -> bool {
        *self != Step::FinalSummary
    }

    pub fn can_go_back(&self) -> bool {
        *self != Step::PersonalInfo
    }
}

/// Where an improved text lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImproveTarget {
    Summary,
    Description(Uuid),
}

impl ImproveTarget {
    pub fn resolve(kind: ImproveKind, experience_id: Option<Uuid>) -> Result<Self, AppError> {
        match (kind, experience_id) {
            (ImproveKind::Summary, _) => Ok(ImproveTarget::Summary),
            (ImproveKind::Description, Some(id)) => Ok(ImproveTarget::Description(id)),
            (ImproveKind::Description, None) => Err(AppError::Validation(
                "experience_id is required to improve a description".to_string(),
            )),
        }
    }

    pub fn kind(&self) -> ImproveKind {
        match self {
            ImproveTarget::Summary => ImproveKind::Summary,
            ImproveTarget::Description(_) => ImproveKind::Description,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Wizard {
    pub step: Step,
    pub cv: CvData,
    pub template: TemplateKind,
    pub education_first: bool,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> Step {
        self.step = Step::from_number(self.step.number().saturating_add(1));
        self.step
    }

    pub fn back(&mut self) -> Step {
        self.step = Step::from_number(self.step.number().saturating_sub(1));
        self.step
    }

    pub fn strength(&self) -> StrengthReport {
        StrengthReport::for_cv(&self.cv)
    }

    pub fn update_field(&mut self, update: FieldUpdate) {
        let cv = &mut self.cv;
        match update {
            FieldUpdate::FullName(v) => cv.full_name = v,
            FieldUpdate::Email(v) => cv.email = v,
            FieldUpdate::Phone(v) => cv.phone = v,
            FieldUpdate::Location(v) => cv.location = v,
            FieldUpdate::Summary(v) => cv.summary = v,
            FieldUpdate::Title(v) => cv.title = v,
            FieldUpdate::PhotoUri(v) => cv.photo_uri = v,
        }
    }

    pub fn add_experience(&mut self) -> Uuid {
        let exp = CvExperience::blank();
        let id = exp.id;
        self.cv.experiences.push(exp);
        id
    }

    pub fn remove_experience(&mut self, id: Uuid) -> bool {
        let before = self.cv.experiences.len();
        self.cv.experiences.retain(|e| e.id != id);
        self.cv.experiences.len() != before
    }

    /// Returns false when no experience has this id. End-date edits are
    /// ignored while the role is marked current.
    pub fn update_experience(&mut self, id: Uuid, update: ExperienceUpdate) -> bool {
        let Some(exp) = self.cv.experiences.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        match update {
            ExperienceUpdate::Role(v) => exp.role = v,
            ExperienceUpdate::Company(v) => exp.company = v,
            ExperienceUpdate::StartDate(v) => exp.start_date = v,
            ExperienceUpdate::EndDate(v) => {
                if !exp.is_current {
                    exp.end_date = v;
                }
            }
            ExperienceUpdate::IsCurrent(v) => exp.is_current = v,
            ExperienceUpdate::Description(v) => exp.description = v,
        }
        true
    }

    pub fn add_education(&mut self) -> Uuid {
        let edu = CvEducation::blank();
        let id = edu.id;
        self.cv.education.push(edu);
        id
    }

    pub fn remove_education(&mut self, id: Uuid) -> bool {
        let before = self.cv.education.len();
        self.cv.education.retain(|e| e.id != id);
        self.cv.education.len() != before
    }

    pub fn update_education(&mut self, id: Uuid, update: EducationUpdate) -> bool {
        let Some(edu) = self.cv.education.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        match update {
            EducationUpdate::Degree(v) => edu.degree = v,
            EducationUpdate::School(v) => edu.school = v,
            EducationUpdate::Year(v) => edu.year = v,
        }
        true
    }

    /// Commits a skill (the Enter gesture). Trimmed; blank and exact duplicates
    /// are ignored. Returns whether the list changed.
    pub fn add_skill(&mut self, value: &str) -> bool {
        let skill = value.trim();
        if skill.is_empty() || self.cv.skills.iter().any(|s| s == skill) {
            return false;
        }
        self.cv.skills.push(skill.to_string());
        true
    }

    pub fn remove_skill(&mut self, value: &str) -> bool {
        let before = self.cv.skills.len();
        self.cv.skills.retain(|s| s != value);
        self.cv.skills.len() != before
    }

    pub fn set_layout(&mut self, template: TemplateKind, education_first: bool) {
        self.template = template;
        self.education_first = education_first;
    }

    pub fn toggle_education_first(&mut self) -> bool {
        self.education_first = !self.education_first;
        self.education_first
    }

    /// Current text at `target`, or `None` if the experience is gone.
    pub fn text_at(&self, target: ImproveTarget) -> Option<&str> {
        match target {
            ImproveTarget::Summary => Some(self.cv.summary.as_str()),
            ImproveTarget::Description(id) => self
                .cv
                .experiences
                .iter()
                .find(|e| e.id == id)
                .map(|e| e.description.as_str()),
        }
    }

    /// Writes improved text back. Returns false if the experience was removed meanwhile.
    pub fn apply_improvement(&mut self, target: ImproveTarget, text: String) -> bool {
        match target {
            ImproveTarget::Summary => {
                self.cv.summary = text;
                true
            }
            ImproveTarget::Description(id) => {
                self.update_experience(id, ExperienceUpdate::Description(text))
            }
        }
    }

    /// Preview of the current draft. Never consumes credits.
    pub fn preview(&self, watermarked: bool) -> Document {
        render(self.template, &self.cv, self.education_first, watermarked)
    }
}
