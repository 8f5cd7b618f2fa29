use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::media::StorageClass;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct University {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// University with its images, as returned by `GET /universities/{id}/images`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityGallery {
    pub university: University,
    pub images: Vec<UniversityImage>,
}

/// Image in a university gallery. At most one per university is primary.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UniversityImage {
    pub id: String,
    pub university_id: String,
    pub image_url: String,
    pub storage_class: Option<String>,
    pub is_primary: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl UniversityImage {
    pub fn storage_class(&self) -> Option<StorageClass> {
        self.storage_class.as_deref().and_then(StorageClass::parse)
    }
}
