//! Student essays and their review status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::pagination::SortOrder;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord,
)]
#[sqlx(type_name = "essay_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EssayStatus {
    Draft,
    InReview,
    Reviewed,
    Final,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Essay {
    pub id: String,
    pub user_id: String,
    pub application_id: Option<String>,
    pub title: String,
    pub prompt: Option<String>,
    pub content: String,
    pub word_count: i32,
    pub status: EssayStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List row: no body text, author name joined in.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EssaySummary {
    pub id: String,
    pub user_id: String,
    pub student_name: String,
    pub title: String,
    pub word_count: i32,
    pub status: EssayStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEssay {
    #[validate(length(min = 1))]
    pub user_id: String,
    pub application_id: Option<String>,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub prompt: Option<String>,
    #[serde(default)]
    pub content: String,
    pub status: Option<EssayStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEssay {
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub prompt: Option<String>,
    pub content: Option<String>,
    pub status: Option<EssayStatus>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EssaySort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    WordCount,
}

impl EssaySort {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "e.created_at",
            Self::UpdatedAt => "e.updated_at",
            Self::Title => "e.title",
            Self::WordCount => "e.word_count",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EssayFilters {
    pub status: Option<EssayStatus>,
    #[validate(length(min = 1))]
    pub user_id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: EssaySort,
    #[serde(default)]
    pub order: SortOrder,
}

/// Whitespace-delimited word count of an essay body.
pub fn word_count(content: &str) -> i32 {
    i32::try_from(content.split_whitespace().count()).unwrap_or(i32::MAX)
}
