//! Dashboard route: one consistent snapshot of platform metrics.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::RequireAdmin;
use crate::services::dashboard;
use crate::AppState;

/// GET /api/dashboard: aggregated platform metrics, never cached.
pub async fn snapshot(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = dashboard::get_snapshot(
        &state.db,
        &state.dashboard_permits,
        state.config.dashboard,
    )
    .await?;
    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        ApiResponse::success(snapshot),
    ))
}
