pub mod config;
pub mod db;
pub mod errors;
pub mod media;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Semaphore;

use crate::config::SNAPSHOT_CONNECTIONS;
use crate::media::MediaStore;

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: config::AppConfig,
    pub media: Arc<dyn MediaStore>,
    /// Bounds concurrent dashboard snapshots to what the pool can serve.
    pub dashboard_permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(db: PgPool, config: config::AppConfig, media: Arc<dyn MediaStore>) -> Self {
        let snapshots = (config.database_max_connections / SNAPSHOT_CONNECTIONS).max(1);
        Self {
            db,
            config,
            media,
            dashboard_permits: Arc::new(Semaphore::new(snapshots as usize)),
        }
    }
}
