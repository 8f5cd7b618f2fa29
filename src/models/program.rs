//! Academic programs offered by universities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::pagination::SortOrder;
use super::syllabus::Syllabus;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub university_id: String,
    pub university_name: String,
    pub program_name: String,
    pub degree_level: String,
    pub field_of_study: Option<String>,
    pub duration_months: Option<i32>,
    pub tuition_fee: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Program with its syllabus, as returned by `GET /programs/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDetail {
    #[serde(flatten)]
    pub program: Program,
    pub syllabus: Option<Syllabus>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgram {
    #[validate(length(min = 1))]
    pub university_id: String,
    #[validate(length(min = 1, max = 300))]
    pub program_name: String,
    #[validate(length(min = 1, max = 100))]
    pub degree_level: String,
    #[validate(length(max = 200))]
    pub field_of_study: Option<String>,
    #[validate(range(min = 1, max = 120))]
    pub duration_months: Option<i32>,
    #[validate(range(min = 0.0))]
    pub tuition_fee: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgram {
    #[validate(length(min = 1, max = 300))]
    pub program_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub degree_level: Option<String>,
    #[validate(length(max = 200))]
    pub field_of_study: Option<String>,
    #[validate(range(min = 1, max = 120))]
    pub duration_months: Option<i32>,
    #[validate(range(min = 0.0))]
    pub tuition_fee: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgramSort {
    #[default]
    CreatedAt,
    ProgramName,
    TuitionFee,
}

impl ProgramSort {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "p.created_at",
            Self::ProgramName => "p.program_name",
            Self::TuitionFee => "p.tuition_fee",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProgramFilters {
    #[validate(length(min = 1))]
    pub university_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub degree_level: Option<String>,
    pub is_active: Option<bool>,
    #[validate(length(min = 1, max = 200))]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: ProgramSort,
    #[serde(default)]
    pub order: SortOrder,
}

/// Minimal program identity used when naming uploaded files.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInfo {
    pub id: String,
    #[serde(rename = "name")]
    pub program_name: String,
    #[serde(rename = "university")]
    pub university_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_info_serializes_display_names() {
        let info = ProgramInfo {
            id: "p1".into(),
            program_name: "Intro to AI!!".into(),
            university_name: "Example University".into(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["name"], "Intro to AI!!");
        assert_eq!(json["university"], "Example University");
    }

    #[test]
    fn duration_bounds_enforced() {
        let input: CreateProgram = serde_json::from_str(
            r#"{"universityId":"u1","programName":"CS","degreeLevel":"BSc","durationMonths":0}"#,
        )
        .unwrap();
        assert!(input.validate().is_err());
    }
}
