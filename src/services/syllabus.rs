//! Syllabus asset lifecycle: one PDF per program, stored on the media host.
//!
//! Upload is remote-first: nothing is recorded unless the host accepted the
//! file. Delete is local-authoritative: the remote delete is attempted but the
//! row is removed whatever the host says.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::db;
use crate::errors::AppError;
use crate::media::{
    self, destroy_best_effort, MediaStore, RemoteCleanup, StorageClass, StoredObject,
    UploadRequest,
};
use crate::models::program::ProgramInfo;
use crate::models::syllabus::Syllabus;
use crate::services::assets::{require_id, IncomingFile, SYLLABUS_RULES};

/// Class requested for PDFs; also the first guess when deleting legacy rows.
const SYLLABUS_CLASS: StorageClass = StorageClass::Raw;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusUploadResult {
    pub success: bool,
    pub file_url: String,
    pub syllabus: Syllabus,
    pub message: String,
    pub program_info: ProgramInfo,
    pub debug_info: UploadDebugInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDebugInfo {
    pub folder: String,
    pub public_id: String,
    pub storage_class: StorageClass,
    pub bytes: u64,
    /// Host-side version of the stored object, when reported.
    pub version: Option<u64>,
    pub original_file_name: String,
    pub replaced_previous: bool,
}

/// Upload (or replace) the syllabus of `program_id`.
pub async fn upload(
    pool: &PgPool,
    store: &dyn MediaStore,
    program_id: Option<&str>,
    file: Option<IncomingFile>,
) -> Result<SyllabusUploadResult, AppError> {
    let file = file.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    SYLLABUS_RULES.check(&file)?;
    let program_id = require_id(program_id, "programId")?;

    let program = find_program_info(pool, program_id).await?;
    let previous = find_by_program(pool, program_id).await?;

    let uploaded_at = Utc::now();
    let folder = format!("syllabi/{program_id}");
    let original_file_name = file.file_name.clone();
    let stored = store
        .upload(UploadRequest {
            folder: folder.clone(),
            public_id: media::syllabus_object_name(&program.program_name, uploaded_at),
            class: SYLLABUS_CLASS,
            file_name: file.file_name,
            content_type: file.content_type,
            data: file.data,
        })
        .await?;

    let syllabus = upsert(pool, program_id, &stored, uploaded_at)
        .await
        .map_err(|source| AppError::PersistedButUnindexed {
            file_url: stored.secure_url.clone(),
            source,
        })?;

    tracing::info!(
        program_id = %program_id,
        file_url = %syllabus.file_url,
        replaced = previous.is_some(),
        "Syllabus stored"
    );

    let replaced_previous = previous.is_some();
    if let Some(old) = previous.filter(|old| old.file_url != syllabus.file_url) {
        remove_replaced_blob(store, &old).await;
    }

    Ok(SyllabusUploadResult {
        success: true,
        file_url: syllabus.file_url.clone(),
        message: if replaced_previous {
            "Syllabus replaced successfully".to_string()
        } else {
            "Syllabus uploaded successfully".to_string()
        },
        program_info: program,
        debug_info: UploadDebugInfo {
            folder,
            public_id: stored.public_id,
            storage_class: stored.class,
            bytes: stored.bytes,
            version: stored.version,
            original_file_name,
            replaced_previous,
        },
        syllabus,
    })
}

/// Delete the syllabus of `program_id`, remote copy first (best effort).
pub async fn delete(
    pool: &PgPool,
    store: &dyn MediaStore,
    program_id: Option<&str>,
) -> Result<RemoteCleanup, AppError> {
    let program_id = require_id(program_id, "programId")?;

    let syllabus = find_by_program(pool, program_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No syllabus for program '{program_id}'")))?;

    let public_id = media::public_id_from_url(&syllabus.file_url)
        .map_err(|e| AppError::Internal(format!("Cannot derive media id: {e}")))?;

    let cleanup =
        destroy_best_effort(store, &public_id, syllabus.storage_class(), SYLLABUS_CLASS).await;
    if !cleanup.succeeded() {
        tracing::warn!(
            program_id = %program_id,
            public_id = %public_id,
            outcome = ?cleanup,
            "Remote syllabus not removed; deleting local record anyway"
        );
    }

    sqlx::query("DELETE FROM syllabi WHERE program_id = $1")
        .bind(program_id)
        .execute(pool)
        .await?;

    Ok(cleanup)
}

pub async fn find_by_program(pool: &PgPool, program_id: &str) -> Result<Option<Syllabus>, AppError> {
    let row = sqlx::query_as::<_, Syllabus>("SELECT * FROM syllabi WHERE program_id = $1")
        .bind(program_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

async fn find_program_info(pool: &PgPool, program_id: &str) -> Result<ProgramInfo, AppError> {
    sqlx::query_as::<_, ProgramInfo>(
        r#"
        SELECT p.id, p.program_name, u.name AS university_name
        FROM programs p
        INNER JOIN universities u ON u.id = p.university_id
        WHERE p.id = $1
        "#,
    )
    .bind(program_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Program '{program_id}' not found")))
}

/// Insert or overwrite the single syllabus row of a program.
async fn upsert(
    pool: &PgPool,
    program_id: &str,
    stored: &StoredObject,
    uploaded_at: DateTime<Utc>,
) -> Result<Syllabus, sqlx::Error> {
    sqlx::query_as::<_, Syllabus>(
        r#"
        INSERT INTO syllabi (id, program_id, file_url, storage_class, uploaded_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (program_id) DO UPDATE SET
            file_url = EXCLUDED.file_url,
            storage_class = EXCLUDED.storage_class,
            uploaded_at = EXCLUDED.uploaded_at
        RETURNING *
        "#,
    )
    .bind(db::new_id())
    .bind(program_id)
    .bind(&stored.secure_url)
    .bind(stored.class.as_str())
    .bind(uploaded_at)
    .fetch_one(pool)
    .await
}

/// Drop the blob a re-upload superseded. Failures only get logged.
async fn remove_replaced_blob(store: &dyn MediaStore, old: &Syllabus) {
    match media::public_id_from_url(&old.file_url) {
        Ok(public_id) => {
            destroy_best_effort(store, &public_id, old.storage_class(), SYLLABUS_CLASS).await;
        }
        Err(e) => {
            tracing::warn!(file_url = %old.file_url, error = %e, "Replaced syllabus URL not parseable");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::RecordingStore;
    use sqlx::postgres::PgPoolOptions;

    /// Pool that never connects; any query would fail.
    fn offline_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(50))
            .connect_lazy("postgres://offline@127.0.0.1:1/none")
            .unwrap()
    }

    fn pdf(len: usize) -> IncomingFile {
        IncomingFile {
            file_name: "syllabus.pdf".into(),
            content_type: "application/pdf".into(),
            data: vec![b'%'; len],
        }
    }

    #[tokio::test]
    async fn non_pdf_rejected_before_remote_call() {
        let store = RecordingStore::default();
        let file = IncomingFile {
            content_type: "text/plain".into(),
            ..pdf(10)
        };
        let err = upload(&offline_pool(), &store, Some("p1"), Some(file))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_pdf_rejected_before_remote_call() {
        let store = RecordingStore::default();
        let err = upload(
            &offline_pool(),
            &store,
            Some("p1"),
            Some(pdf(crate::services::assets::MAX_UPLOAD_BYTES + 1)),
        )
        .await
        .unwrap_err();
        assert!(err.is_validation());
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_or_program_is_validation() {
        let store = RecordingStore::default();
        let pool = offline_pool();
        assert!(upload(&pool, &store, Some("p1"), None).await.unwrap_err().is_validation());
        assert!(upload(&pool, &store, Some(" "), Some(pdf(10)))
            .await
            .unwrap_err()
            .is_validation());
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_without_program_id_is_validation() {
        let store = RecordingStore::default();
        let err = delete(&offline_pool(), &store, None).await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.destroys.lock().unwrap().is_empty());
    }
}
