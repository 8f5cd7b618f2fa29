use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::pagination::SortOrder;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Scholarship {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub description: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub deadline: Option<DateTime<Utc>>,
    pub eligibility: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScholarship {
    #[validate(length(min = 1, max = 300))]
    pub name: String,
    #[validate(length(min = 1, max = 300))]
    pub provider: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub eligibility: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScholarship {
    #[validate(length(min = 1, max = 300))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 300))]
    pub provider: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub amount: Option<f64>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub eligibility: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScholarshipSort {
    #[default]
    CreatedAt,
    Deadline,
    Amount,
    Name,
}

impl ScholarshipSort {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Deadline => "deadline",
            Self::Amount => "amount",
            Self::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipFilters {
    pub is_active: Option<bool>,
    #[validate(length(min = 1, max = 200))]
    pub search: Option<String>,
    /// Only scholarships closing before this instant.
    pub deadline_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_by: ScholarshipSort,
    #[serde(default)]
    pub order: SortOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amount_rejected() {
        let input: CreateScholarship =
            serde_json::from_str(r#"{"name":"Merit","provider":"Fund","amount":-5}"#).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn currency_must_be_iso_code() {
        let input: CreateScholarship = serde_json::from_str(
            r#"{"name":"Merit","provider":"Fund","amount":500,"currency":"EURO"}"#,
        )
        .unwrap();
        assert!(input.validate().is_err());
    }
}
