//! Student accounts (users with the STUDENT role).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::pagination::SortOrder;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    Counselor,
    Admin,
}

/// Student row with activity counters for the management table.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub country: Option<String>,
    pub graduation_year: Option<i32>,
    pub application_count: i64,
    pub essay_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudent {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(range(min = 1990, max = 2100))]
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudent {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(range(min = 1990, max = 2100))]
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StudentSort {
    #[default]
    CreatedAt,
    FullName,
    Email,
}

impl StudentSort {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "u.created_at",
            Self::FullName => "u.full_name",
            Self::Email => "u.email",
        }
    }
}

/// Query parameters for `GET /students`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentFilters {
    /// Matches name or email, case-insensitive.
    #[validate(length(min = 1, max = 200))]
    pub search: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub sort_by: StudentSort,
    #[serde(default)]
    pub order: SortOrder,
}
