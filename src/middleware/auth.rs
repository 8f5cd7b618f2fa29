//! JWT authentication extractor for Axum handlers.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::errors::AppError;
use crate::services::auth::{self as auth_service, AdminRole};
use crate::AppState;

/// Authenticated administrator extracted from a JWT Bearer token.
///
/// Missing or invalid tokens are rejected with 401, valid tokens without an
/// admin role with 403:
/// ```ignore
/// async fn handler(_admin: RequireAdmin) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin {
    pub subject: String,
    pub role: AdminRole,
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        let claims = auth_service::validate_token(bearer.token(), &state.config.jwt_secret)?;

        let role = AdminRole::parse(&claims.role).ok_or_else(|| {
            tracing::warn!(sub = %claims.sub, role = %claims.role, "Non-admin token on admin API");
            AppError::Forbidden("Admin access required".to_string())
        })?;

        Ok(RequireAdmin {
            subject: claims.sub,
            role,
        })
    }
}
