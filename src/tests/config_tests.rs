#[cfg(test)]
mod tests {
    use crate::config::{self, AppConfig};
    use std::fs;

    fn write_temp_config(content: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, content).unwrap();
        (dir, path.display().to_string())
    }

    fn validation_error(cfg: &AppConfig) -> String {
        config::validate(cfg).unwrap_err().to_string()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5500);
        assert_eq!(config.database.url, "sqlite://data/wolkenlager.db");
        assert_eq!(config.storage.upload_dir, "data/uploads");
        assert_eq!(config.storage.default_limit_bytes, 5 * 1024 * 1024 * 1024);
        assert_eq!(config.storage.max_file_bytes, 100 * 1024 * 1024);
        assert_eq!(config.storage.recent_default_limit, 20);
        assert_eq!(config.storage.recent_max_limit, 200);
        assert_eq!(config.auth.token_ttl_hours, 720);
        assert_eq!(config.web.public_dir, "public");
        assert!(config.security.is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_server_port() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(validation_error(&cfg).contains("invalid server.port"));
    }

    #[test]
    fn test_invalid_storage_settings() {
        let mut cfg = AppConfig::default();
        cfg.storage.upload_dir = "  ".to_string();
        assert!(validation_error(&cfg).contains("storage.upload_dir"));

        let mut cfg = AppConfig::default();
        cfg.storage.default_limit_bytes = 0;
        assert!(validation_error(&cfg).contains("storage.default_limit_bytes must be > 0"));

        let mut cfg = AppConfig::default();
        cfg.storage.max_request_bytes = 10;
        cfg.storage.max_file_bytes = 11;
        assert!(validation_error(&cfg).contains("storage.max_request_bytes must be >= storage.max_file_bytes"));

        let mut cfg = AppConfig::default();
        cfg.storage.recent_default_limit = 300;
        assert!(validation_error(&cfg).contains("recent_default_limit must be <="));
    }

    #[test]
    fn test_invalid_auth_settings() {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "short".to_string();
        assert!(validation_error(&cfg).contains("auth.jwt_secret must be at least"));

        let mut cfg = AppConfig::default();
        cfg.auth.token_ttl_hours = 0;
        assert!(validation_error(&cfg).contains("auth.token_ttl_hours must be > 0"));

        let mut cfg = AppConfig::default();
        cfg.auth.token_ttl_hours = u64::MAX;
        assert!(validation_error(&cfg).contains("auth.token_ttl_hours must be <= 8784"));
    }

    #[test]
    fn test_config_from_file() {
        let (_dir, path) = write_temp_config(
            r#"
[server]
host = "192.168.1.1"
port = 9000

[database]
url = "sqlite://custom.db"

[storage]
upload_dir = "/srv/wolkenlager/blobs"
default_limit_bytes = 1000

[security]
enable_hsts = true
hsts_max_age = 600
"#,
        );

        let config = config::load_from(Some(&path)).unwrap();

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.url, "sqlite://custom.db");
        assert_eq!(config.storage.upload_dir, "/srv/wolkenlager/blobs");
        assert_eq!(config.storage.default_limit_bytes, 1000);
        // Keys the file does not set keep their defaults
        assert_eq!(config.storage.recent_max_limit, 200);
        let security = config.security.unwrap();
        assert_eq!(security.enable_hsts, Some(true));
        assert_eq!(security.hsts_max_age, Some(600));
    }

    #[test]
    fn test_invalid_file_values_are_rejected() {
        let (_dir, path) = write_temp_config("[storage]\nrecent_max_limit = 0\n");
        let result = config::load_from(Some(&path));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("recent_"));
    }

    #[test]
    fn test_missing_custom_file_falls_back_to_defaults() {
        let config = config::load_from(Some("/nonexistent/wolkenlager-custom")).unwrap();
        assert_eq!(config.server.port, AppConfig::default().server.port);
    }

    #[test]
    fn test_ensure_sqlite_parent_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("subdir/test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        assert!(!db_path.parent().unwrap().exists());

        config::ensure_sqlite_parent_dir(&db_url).unwrap();

        assert!(db_path.parent().unwrap().exists());
    }

    #[test]
    fn test_ensure_sqlite_parent_dir_non_sqlite() {
        // Non-SQLite URL should not create directories
        let result = config::ensure_sqlite_parent_dir("postgres://localhost/db");
        assert!(result.is_ok());
    }
}
