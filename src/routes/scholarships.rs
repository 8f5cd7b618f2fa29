//! Scholarship catalogue routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::errors::{Ack, ApiResponse, AppError};
use crate::middleware::auth::RequireAdmin;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::scholarship::{
    CreateScholarship, Scholarship, ScholarshipFilters, UpdateScholarship,
};
use crate::routes::extract::{AppJson, AppQuery};
use crate::services::scholarship as scholarship_service;
use crate::AppState;

/// GET /api/scholarships: list scholarships with filters, sorting and pagination.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppQuery(pagination): AppQuery<Pagination>,
    AppQuery(filters): AppQuery<ScholarshipFilters>,
) -> Result<Json<ApiResponse<PagedResult<Scholarship>>>, AppError> {
    filters.validate()?;
    let result = scholarship_service::list(&state.db, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/scholarships/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Scholarship>>, AppError> {
    let item = scholarship_service::find_by_id(&state.db, &id).await?;
    Ok(ApiResponse::success(item))
}

/// POST /api/scholarships
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(body): AppJson<CreateScholarship>,
) -> Result<(StatusCode, Json<ApiResponse<Scholarship>>), AppError> {
    body.validate()?;
    let item = scholarship_service::create(&state.db, &body).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(item)))
}

/// PUT /api/scholarships/{id}: partial update; omitted fields keep their value.
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateScholarship>,
) -> Result<Json<ApiResponse<Scholarship>>, AppError> {
    body.validate()?;
    let item = scholarship_service::update(&state.db, &id, &body).await?;
    Ok(ApiResponse::success(item))
}

/// DELETE /api/scholarships/{id}
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Ack>, AppError> {
    scholarship_service::delete(&state.db, &id).await?;
    Ok(Ack::new("Scholarship deleted"))
}
