use std::net::SocketAddr;
use std::sync::Arc;

use admitly::config::AppConfig;
use admitly::media::CloudinaryStore;
use admitly::{db, routes, AppState};
use anyhow::Context;
use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// M-MIMALLOC-APP: Use mimalloc as global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "admitly=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let pool = db::create_pool(
        &config.database_url,
        config.database_max_connections,
        config.dashboard.acquire_timeout,
    )
    .await
    .context("Failed to connect to database")?;
    db::migrate(&pool).await.context("Failed to run migrations")?;

    let media = CloudinaryStore::new(config.media.clone()).context("Failed to build media client")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid BACKEND_HOST/BACKEND_PORT")?;
    let tls = config.tls.clone();

    let state = AppState::new(pool, config, Arc::new(media));
    let app = routes::router(state);

    match tls {
        Some(tls) => {
            rustls::crypto::aws_lc_rs::default_provider()
                .install_default()
                .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;
            let rustls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                &tls.cert_path,
                &tls.key_path,
            )
            .await
            .context("Failed to load TLS certificate")?;

            tracing::info!(host = %addr, "Starting Admitly admin API (TLS)");
            axum_server::bind_rustls(addr, rustls_config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(host = %addr, "Starting Admitly admin API");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
