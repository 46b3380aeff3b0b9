use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The CV being drafted in a wizard session. Lives only in memory until exported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvData {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
    /// Headline shown under the name. Templates fall back to their own placeholder.
    pub title: Option<String>,
    pub photo_uri: Option<String>,
    pub experiences: Vec<CvExperience>,
    pub education: Vec<CvEducation>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvExperience {
    pub id: Uuid,
    pub role: String,
    pub company: String,
    pub start_date: String,
    /// Ignored while `is_current` is set.
    pub end_date: String,
    pub is_current: bool,
    pub description: String,
}

impl CvExperience {
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: String::new(),
            company: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            is_current: false,
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvEducation {
    pub id: Uuid,
    pub degree: String,
    pub school: String,
    pub year: String,
}

impl CvEducation {
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            degree: String::new(),
            school: String::new(),
            year: String::new(),
        }
    }
}

/// Patch for a single personal-info field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    FullName(String),
    Email(String),
    Phone(String),
    Location(String),
    Summary(String),
    Title(Option<String>),
    PhotoUri(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ExperienceUpdate {
    Role(String),
    Company(String),
    StartDate(String),
    EndDate(String),
    IsCurrent(bool),
    Description(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum EducationUpdate {
    Degree(String),
    School(String),
    Year(String),
}
