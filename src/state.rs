use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::content::{ContentStore, DiskContentStore};
use crate::drive::Drive;
use crate::metrics::Metrics;
use crate::middleware::EndpointRateLimiter;

/// The shared application state.
///
/// Cheap to clone; every field is either a pool, an `Arc` or a handle around one.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: sqlx::SqlitePool,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// The storage core operating on `db` and the content store.
    pub drive: Drive,
    /// Token signing and verification keys.
    pub jwt: JwtKeys,
    /// The application metrics.
    pub metrics: Metrics,
    /// Stricter limits for login, registration and upload.
    pub rate_limiter: EndpointRateLimiter,
}

impl AppState {
    /// Builds the state with the on-disk content store under `storage.upload_dir`.
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> std::io::Result<Self> {
        let content: Arc<dyn ContentStore> = Arc::new(DiskContentStore::new(&config.storage.upload_dir)?);
        Ok(Self::with_content_store(db, config, content))
    }

    /// Builds the state around an explicit content store.
    pub fn with_content_store(db: sqlx::SqlitePool, config: AppConfig, content: Arc<dyn ContentStore>) -> Self {
        let rate_limiter = EndpointRateLimiter::new().with_limits(vec![
            ("POST /api/auth/login", 20, 60),    // 20 logins per minute
            ("POST /api/auth/register", 10, 60), // 10 registrations per minute
            ("POST /api/files/upload", 60, 60),  // 60 upload batches per minute
        ]);

        Self {
            drive: Drive::new(db.clone(), content),
            jwt: JwtKeys::new(&config.auth),
            db,
            config: Arc::new(config),
            metrics: Metrics::new(),
            rate_limiter,
        }
    }
}
