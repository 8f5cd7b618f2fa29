//! Student management routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::errors::{Ack, ApiResponse, AppError};
use crate::middleware::auth::RequireAdmin;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::student::{CreateStudent, Student, StudentFilters, UpdateStudent};
use crate::routes::extract::{AppJson, AppQuery};
use crate::services::student as student_service;
use crate::AppState;

/// GET /api/students: list students with filters, sorting and pagination.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppQuery(pagination): AppQuery<Pagination>,
    AppQuery(filters): AppQuery<StudentFilters>,
) -> Result<Json<ApiResponse<PagedResult<Student>>>, AppError> {
    filters.validate()?;
    let result = student_service::list(&state.db, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/students/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let item = student_service::find_by_id(&state.db, &id).await?;
    Ok(ApiResponse::success(item))
}

/// POST /api/students
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(body): AppJson<CreateStudent>,
) -> Result<(StatusCode, Json<ApiResponse<Student>>), AppError> {
    body.validate()?;
    let item = student_service::create(&state.db, &body).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(item)))
}

/// PUT /api/students/{id}: partial update; omitted fields keep their value.
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateStudent>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    body.validate()?;
    let item = student_service::update(&state.db, &id, &body).await?;
    Ok(ApiResponse::success(item))
}

/// DELETE /api/students/{id}
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Ack>, AppError> {
    student_service::delete(&state.db, &id).await?;
    Ok(Ack::new("Student deleted"))
}
