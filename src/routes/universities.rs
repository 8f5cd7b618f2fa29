//! University gallery reads.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::RequireAdmin;
use crate::models::university::UniversityGallery;
use crate::services::university_image as image_service;
use crate::AppState;

/// GET /api/universities/{id}/images
pub async fn gallery(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UniversityGallery>>, AppError> {
    let gallery = image_service::gallery(&state.db, &id).await?;
    Ok(ApiResponse::success(gallery))
}
