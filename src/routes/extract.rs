//! Extractors whose rejections use the API error envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

/// `Query` that rejects with `VALIDATION_ERROR` instead of a plain-text 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `Json` body that rejects with `VALIDATION_ERROR`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
