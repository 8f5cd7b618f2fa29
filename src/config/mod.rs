use std::env;
use std::time::Duration;

/// Connections one dashboard snapshot holds at once: the leader plus six readers.
pub const SNAPSHOT_CONNECTIONS: u32 = 7;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing or invalid environment variable: {0}")]
    Env(#[from] env::VarError),

    #[error("DATABASE_MAX_CONNECTIONS must be at least {}, got {}", SNAPSHOT_CONNECTIONS, .0)]
    PoolTooSmall(u32),

    #[error("MEDIA_SIGNATURE_ALGORITHM must be sha1 or sha256, got '{0}'")]
    UnknownSignatureAlgorithm(String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub media: MediaConfig,
    pub dashboard: DashboardConfig,
    pub tls: Option<TlsConfig>,
}

/// Credentials for the remote media host.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub api_base: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub signature_algorithm: SignatureAlgorithm,
}

/// Digest the media host expects on signed requests; the host default is SHA-1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(ConfigError::UnknownSignatureAlgorithm(other.to_string())),
        }
    }
}

/// Time bounds for the dashboard snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DashboardConfig {
    /// Upper bound on waiting for any single pooled connection.
    pub acquire_timeout: Duration,
    /// Upper bound on the whole snapshot, connection waits included.
    pub execute_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            acquire_timeout: Duration::from_secs(10),
            execute_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let tls = match (env::var("TLS_CERT_PATH"), env::var("TLS_KEY_PATH")) {
            (Ok(cert_path), Ok(key_path)) => Some(TlsConfig {
                cert_path,
                key_path,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: check_pool_size(parse_or("DATABASE_MAX_CONNECTIONS", 10))?,
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("BACKEND_PORT", 3000),
            jwt_secret: env::var("JWT_SECRET")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            media: MediaConfig {
                api_base: env::var("MEDIA_API_BASE")
                    .unwrap_or_else(|_| "https://api.cloudinary.com".to_string()),
                cloud_name: env::var("MEDIA_CLOUD_NAME")?,
                api_key: env::var("MEDIA_API_KEY")?,
                api_secret: env::var("MEDIA_API_SECRET")?,
                signature_algorithm: match env::var("MEDIA_SIGNATURE_ALGORITHM") {
                    Ok(v) => SignatureAlgorithm::parse(&v)?,
                    Err(_) => SignatureAlgorithm::default(),
                },
            },
            dashboard: DashboardConfig {
                acquire_timeout: Duration::from_secs(parse_or("DASHBOARD_ACQUIRE_TIMEOUT_SECS", 10)),
                execute_timeout: Duration::from_secs(parse_or("DASHBOARD_EXECUTE_TIMEOUT_SECS", 30)),
            },
            tls,
        })
    }
}

/// The pool must fit at least one full dashboard snapshot.
pub fn check_pool_size(max_connections: u32) -> Result<u32, ConfigError> {
    if max_connections < SNAPSHOT_CONNECTIONS {
        return Err(ConfigError::PoolTooSmall(max_connections));
    }
    Ok(max_connections)
}

/// Read a numeric variable, falling back to `default` when unset or malformed.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
