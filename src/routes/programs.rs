//! Program routes. Single-program responses include the syllabus.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::errors::{Ack, ApiResponse, AppError};
use crate::middleware::auth::RequireAdmin;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::program::{
    CreateProgram, Program, ProgramDetail, ProgramFilters, UpdateProgram,
};
use crate::routes::extract::{AppJson, AppQuery};
use crate::services::program as program_service;
use crate::AppState;

/// GET /api/programs: list programs with filters, sorting and pagination.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppQuery(pagination): AppQuery<Pagination>,
    AppQuery(filters): AppQuery<ProgramFilters>,
) -> Result<Json<ApiResponse<PagedResult<Program>>>, AppError> {
    filters.validate()?;
    let result = program_service::list(&state.db, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/programs/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProgramDetail>>, AppError> {
    let item = program_service::find_detail(&state.db, &id).await?;
    Ok(ApiResponse::success(item))
}

/// POST /api/programs
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(body): AppJson<CreateProgram>,
) -> Result<(StatusCode, Json<ApiResponse<ProgramDetail>>), AppError> {
    body.validate()?;
    let item = program_service::create(&state.db, &body).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(item)))
}

/// PUT /api/programs/{id}: partial update; omitted fields keep their value.
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateProgram>,
) -> Result<Json<ApiResponse<ProgramDetail>>, AppError> {
    body.validate()?;
    let item = program_service::update(&state.db, &id, &body).await?;
    Ok(ApiResponse::success(item))
}

/// DELETE /api/programs/{id}
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Ack>, AppError> {
    program_service::delete(&state.db, &id).await?;
    Ok(Ack::new("Program deleted"))
}
