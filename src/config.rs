use std::path::Path;

use serde::Deserialize;

const DEFAULT_JWT_SECRET: &str = "wolkenlager-development-secret";
const MIN_JWT_SECRET_LEN: usize = 16;
const MAX_TOKEN_TTL_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded file content.
    pub upload_dir: String,
    /// Quota assigned to newly registered users.
    pub default_limit_bytes: i64,
    pub max_file_bytes: u64,
    pub max_request_bytes: usize,
    pub recent_default_limit: i64,
    pub recent_max_limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    pub public_dir: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    pub enable_hsts: Option<bool>,
    pub hsts_max_age: Option<u64>,
    pub hsts_include_subdomains: Option<bool>,
    pub csp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub web: WebConfig,
    pub security: Option<SecurityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();
    load_from(std::env::var("WOLKENLAGER_CONFIG").ok().as_deref())
}

/// Embedded defaults -> `wolkenlager.toml` (CWD) -> `custom_path` -> environment.
pub fn load_from(custom_path: Option<&str>) -> anyhow::Result<AppConfig> {
    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        .add_source(::config::File::with_name("wolkenlager").required(false));

    if let Some(path) = custom_path {
        builder = builder.add_source(::config::File::with_name(path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("WOLKENLAGER").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // Storage
    if cfg.storage.upload_dir.trim().is_empty() {
        return Err(anyhow::anyhow!("storage.upload_dir must not be empty"));
    }
    if cfg.storage.default_limit_bytes <= 0 {
        return Err(anyhow::anyhow!("storage.default_limit_bytes must be > 0"));
    }
    if cfg.storage.max_file_bytes == 0 {
        return Err(anyhow::anyhow!("storage.max_file_bytes must be > 0"));
    }
    if (cfg.storage.max_request_bytes as u64) < cfg.storage.max_file_bytes {
        return Err(anyhow::anyhow!("storage.max_request_bytes must be >= storage.max_file_bytes"));
    }
    if cfg.storage.recent_default_limit <= 0 || cfg.storage.recent_max_limit <= 0 {
        return Err(anyhow::anyhow!("storage.recent_*_limit must be > 0"));
    }
    if cfg.storage.recent_default_limit > cfg.storage.recent_max_limit {
        return Err(anyhow::anyhow!("storage.recent_default_limit must be <= storage.recent_max_limit"));
    }

    // Auth
    if cfg.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
        return Err(anyhow::anyhow!("auth.jwt_secret must be at least {} bytes", MIN_JWT_SECRET_LEN));
    }
    if cfg.auth.jwt_secret == DEFAULT_JWT_SECRET {
        tracing::warn!("Using the built-in development JWT secret; set WOLKENLAGER__AUTH__JWT_SECRET");
    }
    if cfg.auth.token_ttl_hours == 0 {
        return Err(anyhow::anyhow!("auth.token_ttl_hours must be > 0"));
    }
    if cfg.auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
        return Err(anyhow::anyhow!("auth.token_ttl_hours must be <= {}", MAX_TOKEN_TTL_HOURS));
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        // On Windows, handle URLs like sqlite:///C:/... by stripping the leading '/'
        #[cfg(windows)]
        let path = {
            let bytes = path.as_bytes();
            if bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' && bytes[1].is_ascii_alphabetic() {
                &path[1..]
            } else {
                path
            }
        };
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
