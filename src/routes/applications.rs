//! College application routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::errors::{Ack, ApiResponse, AppError};
use crate::middleware::auth::RequireAdmin;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::application::{
    Application, ApplicationFilters, ApplicationSummary, CreateApplication, UpdateApplication,
};
use crate::routes::extract::{AppJson, AppQuery};
use crate::services::application as application_service;
use crate::AppState;

/// GET /api/applications: list applications with filters, sorting and pagination.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppQuery(pagination): AppQuery<Pagination>,
    AppQuery(filters): AppQuery<ApplicationFilters>,
) -> Result<Json<ApiResponse<PagedResult<ApplicationSummary>>>, AppError> {
    filters.validate()?;
    let result = application_service::list(&state.db, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/applications/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Application>>, AppError> {
    let item = application_service::find_by_id(&state.db, &id).await?;
    Ok(ApiResponse::success(item))
}

/// POST /api/applications
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(body): AppJson<CreateApplication>,
) -> Result<(StatusCode, Json<ApiResponse<Application>>), AppError> {
    body.validate()?;
    let item = application_service::create(&state.db, &body).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(item)))
}

/// PUT /api/applications/{id}: partial update; omitted fields keep their value.
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateApplication>,
) -> Result<Json<ApiResponse<Application>>, AppError> {
    body.validate()?;
    let item = application_service::update(&state.db, &id, &body).await?;
    Ok(ApiResponse::success(item))
}

/// DELETE /api/applications/{id}
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Ack>, AppError> {
    application_service::delete(&state.db, &id).await?;
    Ok(Ack::new("Application deleted"))
}
