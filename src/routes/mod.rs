//! Route definitions for the Admitly admin API.

pub mod applications;
pub mod dashboard;
pub mod essays;
pub mod extract;
pub mod health;
pub mod programs;
pub mod scholarships;
pub mod students;
pub mod universities;
pub mod uploads;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::AppState;

/// Multipart bodies may carry a 10 MiB file plus form overhead.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let upload_routes = Router::new()
        .route(
            "/upload/syllabus",
            post(uploads::upload_syllabus).delete(uploads::delete_syllabus),
        )
        .route(
            "/upload/university-image",
            post(uploads::upload_university_image),
        )
        .route(
            "/upload/university-image/{image_id}",
            delete(uploads::delete_university_image),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(UPLOAD_BODY_LIMIT));

    let management_routes = Router::new()
        .route(
            "/students",
            get(students::list).post(students::create),
        )
        .route(
            "/students/{id}",
            get(students::get_by_id)
                .put(students::update)
                .delete(students::delete),
        )
        .route("/essays", get(essays::list).post(essays::create))
        .route(
            "/essays/{id}",
            get(essays::get_by_id)
                .put(essays::update)
                .delete(essays::delete),
        )
        .route(
            "/applications",
            get(applications::list).post(applications::create),
        )
        .route(
            "/applications/{id}",
            get(applications::get_by_id)
                .put(applications::update)
                .delete(applications::delete),
        )
        .route(
            "/scholarships",
            get(scholarships::list).post(scholarships::create),
        )
        .route(
            "/scholarships/{id}",
            get(scholarships::get_by_id)
                .put(scholarships::update)
                .delete(scholarships::delete),
        )
        .route("/universities/{id}/images", get(universities::gallery))
        .route("/programs", get(programs::list).post(programs::create))
        .route(
            "/programs/{id}",
            get(programs::get_by_id)
                .put(programs::update)
                .delete(programs::delete),
        );

    let api = Router::new()
        .route("/dashboard", get(dashboard::snapshot))
        .merge(upload_routes)
        .merge(management_routes);

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api", api)
        .layer(cors_layer(&state.config.frontend_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(value) => AllowOrigin::exact(value),
        Err(e) => {
            tracing::warn!(frontend_url = %frontend_url, error = %e, "Invalid FRONTEND_URL; CORS disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
