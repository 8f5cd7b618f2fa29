//! Essay routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::errors::{Ack, ApiResponse, AppError};
use crate::middleware::auth::RequireAdmin;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::essay::{CreateEssay, Essay, EssayFilters, EssaySummary, UpdateEssay};
use crate::routes::extract::{AppJson, AppQuery};
use crate::services::essay as essay_service;
use crate::AppState;

/// GET /api/essays: list essays with filters, sorting and pagination.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppQuery(pagination): AppQuery<Pagination>,
    AppQuery(filters): AppQuery<EssayFilters>,
) -> Result<Json<ApiResponse<PagedResult<EssaySummary>>>, AppError> {
    filters.validate()?;
    let result = essay_service::list(&state.db, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/essays/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Essay>>, AppError> {
    let item = essay_service::find_by_id(&state.db, &id).await?;
    Ok(ApiResponse::success(item))
}

/// POST /api/essays
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(body): AppJson<CreateEssay>,
) -> Result<(StatusCode, Json<ApiResponse<Essay>>), AppError> {
    body.validate()?;
    let item = essay_service::create(&state.db, &body).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(item)))
}

/// PUT /api/essays/{id}: partial update; omitted fields keep their value.
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateEssay>,
) -> Result<Json<ApiResponse<Essay>>, AppError> {
    body.validate()?;
    let item = essay_service::update(&state.db, &id, &body).await?;
    Ok(ApiResponse::success(item))
}

/// DELETE /api/essays/{id}
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Ack>, AppError> {
    essay_service::delete(&state.db, &id).await?;
    Ok(Ack::new("Essay deleted"))
}
