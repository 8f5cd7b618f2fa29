use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::media::StorageClass;

/// The one PDF syllabus attached to a program.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Syllabus {
    pub id: String,
    pub program_id: String,
    pub file_url: String,
    /// Storage class recorded at upload; absent on rows created before it was tracked.
    pub storage_class: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Syllabus {
    pub fn storage_class(&self) -> Option<StorageClass> {
        self.storage_class.as_deref().and_then(StorageClass::parse)
    }
}
