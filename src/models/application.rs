//! College applications submitted by students.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::pagination::SortOrder;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord,
)]
#[sqlx(type_name = "application_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
    Waitlisted,
    Withdrawn,
}

impl ApplicationStatus {
    /// Statuses that count as "submitted" for success-rate purposes.
    pub const SUBMITTED: [ApplicationStatus; 5] = [
        Self::Submitted,
        Self::UnderReview,
        Self::Accepted,
        Self::Rejected,
        Self::Waitlisted,
    ];
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub user_id: String,
    pub university_id: String,
    pub program_id: Option<String>,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Summary DTO for list views and the dashboard feed.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub id: String,
    pub user_id: String,
    pub student_name: String,
    pub university_id: String,
    pub university_name: String,
    pub program_name: Option<String>,
    pub status: ApplicationStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplication {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub university_id: String,
    pub program_id: Option<String>,
    pub status: Option<ApplicationStatus>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplication {
    pub program_id: Option<String>,
    pub status: Option<ApplicationStatus>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplicationSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Deadline,
}

impl ApplicationSort {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "a.created_at",
            Self::UpdatedAt => "a.updated_at",
            Self::Deadline => "a.deadline",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFilters {
    pub status: Option<ApplicationStatus>,
    #[validate(length(min = 1))]
    pub user_id: Option<String>,
    #[validate(length(min = 1))]
    pub university_id: Option<String>,
    #[validate(length(min = 1))]
    pub program_id: Option<String>,
    #[serde(default)]
    pub sort_by: ApplicationSort,
    #[serde(default)]
    pub order: SortOrder,
}
