//! University gallery images: upload, and delete with primary promotion.

use chrono::Utc;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use crate::db;
use crate::errors::AppError;
use crate::media::{self, destroy_best_effort, MediaStore, RemoteCleanup, StorageClass, UploadRequest};
use crate::models::university::{University, UniversityGallery, UniversityImage};
use crate::services::assets::{require_id, IncomingFile, IMAGE_RULES};

const IMAGE_CLASS: StorageClass = StorageClass::Image;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResult {
    pub success: bool,
    pub image: UniversityImage,
    pub message: String,
}

/// What happened when an image was removed.
#[derive(Debug)]
pub struct ImageDeletion {
    pub image: UniversityImage,
    pub cleanup: RemoteCleanup,
    /// Image that became primary because the deleted one was.
    pub promoted: Option<String>,
}

/// Upload an image into a university's gallery.
///
/// The first image of a university is always primary. Asking for primary
/// demotes the current one in the same transaction.
pub async fn upload(
    pool: &PgPool,
    store: &dyn MediaStore,
    university_id: Option<&str>,
    make_primary: bool,
    file: Option<IncomingFile>,
) -> Result<ImageUploadResult, AppError> {
    let file = file.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    IMAGE_RULES.check(&file)?;
    let university_id = require_id(university_id, "universityId")?;

    let university_name: String =
        sqlx::query_scalar("SELECT name FROM universities WHERE id = $1")
            .bind(university_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("University '{university_id}' not found")))?;

    let stored = store
        .upload(UploadRequest {
            folder: format!("universities/{university_id}"),
            public_id: media::university_image_object_name(&university_name, Utc::now()),
            class: IMAGE_CLASS,
            file_name: file.file_name,
            content_type: file.content_type,
            data: file.data,
        })
        .await?;

    let image = insert_image(pool, university_id, &stored.secure_url, stored.class, make_primary)
        .await
        .map_err(|source| AppError::PersistedButUnindexed {
            file_url: stored.secure_url.clone(),
            source,
        })?;

    tracing::info!(
        university_id = %university_id,
        image_id = %image.id,
        is_primary = image.is_primary,
        "University image stored"
    );

    Ok(ImageUploadResult {
        success: true,
        image,
        message: "Image uploaded successfully".to_string(),
    })
}

/// Remove an image, remote copy first (best effort), then the row.
pub async fn delete(
    pool: &PgPool,
    store: &dyn MediaStore,
    image_id: &str,
) -> Result<ImageDeletion, AppError> {
    let image_id = require_id(Some(image_id), "imageId")?;

    let image = find_by_id(pool, image_id).await?;
    let public_id = media::public_id_from_url(&image.image_url)
        .map_err(|e| AppError::Internal(format!("Cannot derive media id: {e}")))?;

    let cleanup = destroy_best_effort(store, &public_id, image.storage_class(), IMAGE_CLASS).await;
    if !cleanup.succeeded() {
        tracing::warn!(
            image_id = %image_id,
            public_id = %public_id,
            outcome = ?cleanup,
            "Remote image not removed; deleting local record anyway"
        );
    }

    let mut tx = pool.begin().await?;
    let deleted = sqlx::query_as::<_, UniversityImage>(
        "DELETE FROM university_images WHERE id = $1 RETURNING *",
    )
    .bind(image_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("University image '{image_id}' not found")))?;

    let promoted = if deleted.is_primary {
        promote_next(&mut tx, &deleted.university_id).await?
    } else {
        None
    };
    tx.commit().await?;

    if let Some(ref id) = promoted {
        tracing::info!(university_id = %deleted.university_id, image_id = %id, "Promoted new primary image");
    }

    Ok(ImageDeletion {
        image: deleted,
        cleanup,
        promoted,
    })
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<UniversityImage, AppError> {
    sqlx::query_as::<_, UniversityImage>("SELECT * FROM university_images WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("University image '{id}' not found")))
}

/// A university with its gallery; 404 when the university does not exist.
pub async fn gallery(pool: &PgPool, university_id: &str) -> Result<UniversityGallery, AppError> {
    let university_id = require_id(Some(university_id), "universityId")?;
    let university = sqlx::query_as::<_, University>(
        "SELECT id, name, country, city, website, is_active, created_at FROM universities WHERE id = $1",
    )
    .bind(university_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("University '{university_id}' not found")))?;

    let images = list_for_university(pool, university_id).await?;
    Ok(UniversityGallery { university, images })
}

/// Gallery of a university, primary first then by display order.
pub async fn list_for_university(
    pool: &PgPool,
    university_id: &str,
) -> Result<Vec<UniversityImage>, AppError> {
    let rows = sqlx::query_as::<_, UniversityImage>(
        r#"
        SELECT * FROM university_images
        WHERE university_id = $1
        ORDER BY is_primary DESC, display_order ASC, created_at ASC
        "#,
    )
    .bind(university_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn insert_image(
    pool: &PgPool,
    university_id: &str,
    image_url: &str,
    class: StorageClass,
    make_primary: bool,
) -> Result<UniversityImage, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Serializes concurrent uploads for the same university.
    sqlx::query("SELECT id FROM universities WHERE id = $1 FOR UPDATE")
        .bind(university_id)
        .execute(&mut *tx)
        .await?;

    let (existing, next_order): (i64, i32) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(MAX(display_order) + 1, 0)
        FROM university_images
        WHERE university_id = $1
        "#,
    )
    .bind(university_id)
    .fetch_one(&mut *tx)
    .await?;

    let is_primary = make_primary || existing == 0;
    if is_primary {
        sqlx::query(
            "UPDATE university_images SET is_primary = FALSE WHERE university_id = $1 AND is_primary",
        )
        .bind(university_id)
        .execute(&mut *tx)
        .await?;
    }

    let image = sqlx::query_as::<_, UniversityImage>(
        r#"
        INSERT INTO university_images
            (id, university_id, image_url, storage_class, is_primary, display_order)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(db::new_id())
    .bind(university_id)
    .bind(image_url)
    .bind(class.as_str())
    .bind(is_primary)
    .bind(next_order)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(image)
}

/// Make the lowest-ordered remaining image primary.
async fn promote_next(
    tx: &mut Transaction<'static, Postgres>,
    university_id: &str,
) -> Result<Option<String>, AppError> {
    let promoted: Option<String> = sqlx::query_scalar(
        r#"
        UPDATE university_images SET is_primary = TRUE
        WHERE id = (
            SELECT id FROM university_images
            WHERE university_id = $1
            ORDER BY display_order ASC, created_at ASC
            LIMIT 1
            FOR UPDATE
        )
        RETURNING id
        "#,
    )
    .bind(university_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(promoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::RecordingStore;
    use sqlx::postgres::PgPoolOptions;

    fn offline_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(50))
            .connect_lazy("postgres://offline@127.0.0.1:1/none")
            .unwrap()
    }

    fn image(content_type: &str) -> IncomingFile {
        IncomingFile {
            file_name: "campus.png".into(),
            content_type: content_type.into(),
            data: vec![1u8; 64],
        }
    }

    #[tokio::test]
    async fn pdf_is_not_an_image() {
        let store = RecordingStore::default();
        let err = upload(&offline_pool(), &store, Some("u1"), false, Some(image("application/pdf")))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn university_id_required() {
        let store = RecordingStore::default();
        let err = upload(&offline_pool(), &store, None, true, Some(image("image/webp")))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn blank_image_id_rejected() {
        let store = RecordingStore::default();
        let err = delete(&offline_pool(), &store, "  ").await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.destroys.lock().unwrap().is_empty());
    }
}
