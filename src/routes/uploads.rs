//! Asset routes: syllabus PDFs and university images.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Deserialize;

use crate::errors::{Ack, AppError};
use crate::media::RemoteCleanup;
use crate::middleware::auth::RequireAdmin;
use crate::routes::extract::AppQuery;
use crate::services::assets::IncomingFile;
use crate::services::syllabus::{self as syllabus_service, SyllabusUploadResult};
use crate::services::university_image::{self as image_service, ImageUploadResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusQuery {
    pub program_id: Option<String>,
}

/// POST /api/upload/syllabus: upload or replace a program's syllabus (multipart).
pub async fn upload_syllabus(
    State(state): State<AppState>,
    admin: RequireAdmin,
    multipart: Multipart,
) -> Result<Json<SyllabusUploadResult>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.file.take();
    let result = syllabus_service::upload(
        &state.db,
        state.media.as_ref(),
        form.field("programId"),
        file,
    )
    .await?;
    tracing::info!(
        admin = %admin.subject,
        role = admin.role.as_str(),
        file_url = %result.file_url,
        "Syllabus uploaded"
    );
    Ok(Json(result))
}

/// DELETE /api/upload/syllabus?programId=: delete a program's syllabus.
pub async fn delete_syllabus(
    State(state): State<AppState>,
    admin: RequireAdmin,
    AppQuery(query): AppQuery<SyllabusQuery>,
) -> Result<Json<Ack>, AppError> {
    let cleanup = syllabus_service::delete(
        &state.db,
        state.media.as_ref(),
        query.program_id.as_deref(),
    )
    .await?;
    tracing::info!(
        admin = %admin.subject,
        role = admin.role.as_str(),
        program_id = query.program_id.as_deref().unwrap_or_default(),
        ?cleanup,
        "Syllabus deleted"
    );
    Ok(Ack::new(cleanup_message("Syllabus", cleanup)))
}

/// POST /api/upload/university-image: add an image to a university gallery (multipart).
pub async fn upload_university_image(
    State(state): State<AppState>,
    admin: RequireAdmin,
    multipart: Multipart,
) -> Result<Json<ImageUploadResult>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.file.take();
    let make_primary = parse_flag(form.field("isPrimary"))?;
    let result = image_service::upload(
        &state.db,
        state.media.as_ref(),
        form.field("universityId"),
        make_primary,
        file,
    )
    .await?;
    tracing::info!(
        admin = %admin.subject,
        role = admin.role.as_str(),
        image_id = %result.image.id,
        "University image uploaded"
    );
    Ok(Json(result))
}

/// DELETE /api/upload/university-image/{imageId}: delete an image, promoting a new primary.
pub async fn delete_university_image(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(image_id): Path<String>,
) -> Result<Json<Ack>, AppError> {
    let deletion = image_service::delete(&state.db, state.media.as_ref(), &image_id).await?;
    tracing::info!(
        admin = %admin.subject,
        role = admin.role.as_str(),
        image_id = %image_id,
        university_id = %deletion.image.university_id,
        promoted = ?deletion.promoted,
        "University image deleted"
    );
    let mut message = cleanup_message("Image", deletion.cleanup);
    if let Some(promoted) = deletion.promoted {
        message.push_str(&format!("; image {promoted} is now primary"));
    }
    Ok(Ack::new(message))
}

/// Parts of a multipart upload: at most one file plus text fields.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<IncomingFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" => {
                    if form.file.is_some() {
                        return Err(AppError::Validation(
                            "Exactly one 'file' part is allowed".to_string(),
                        ));
                    }
                    let file_name = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?
                        .to_vec();
                    form.file = Some(IncomingFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
                "" => {}
                _ => {
                    let text = field.text().await.map_err(|e| {
                        AppError::Validation(format!("Failed to read field '{name}': {e}"))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

fn parse_flag(value: Option<&str>) -> Result<bool, AppError> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(AppError::Validation(format!(
            "isPrimary must be true or false, got '{other}'"
        ))),
    }
}

fn cleanup_message(subject: &str, cleanup: RemoteCleanup) -> String {
    match cleanup {
        RemoteCleanup::Deleted(_) => format!("{subject} deleted successfully"),
        RemoteCleanup::NotFound => {
            format!("{subject} record deleted; file was already absent from storage")
        }
        RemoteCleanup::Failed => {
            format!("{subject} record deleted; stored file could not be removed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::StorageClass;

    #[test]
    fn flag_parsing() {
        assert!(!parse_flag(None).unwrap());
        assert!(parse_flag(Some("TRUE")).unwrap());
        assert!(parse_flag(Some("1")).unwrap());
        assert!(!parse_flag(Some("false")).unwrap());
        assert!(parse_flag(Some("yes please")).is_err());
    }

    #[test]
    fn cleanup_messages_distinguish_outcomes() {
        assert_eq!(
            cleanup_message("Syllabus", RemoteCleanup::Deleted(StorageClass::Raw)),
            "Syllabus deleted successfully"
        );
        assert!(cleanup_message("Image", RemoteCleanup::Failed).contains("could not be removed"));
    }
}
