//! Configuration module for the recipe backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! The database variables match the container contract (DB_HOST, DB_NAME,
//! DB_USER, DB_PASSWORD).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres host
    pub db_host: String,
    /// Postgres port
    pub db_port: u16,
    /// Database name
    pub db_name: String,
    /// Database user
    pub db_user: String,
    /// Database password
    pub db_password: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Root directory for uploaded media files
    pub media_root: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());

        let db_port = env::var("DB_PORT")
            .unwrap_or_else(|_| "5432".to_string())
            .parse()
            .expect("Invalid DB_PORT format");

        let db_name = env::var("DB_NAME").unwrap_or_else(|_| "recipes".to_string());
        let db_user = env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string());
        let db_password = env::var("DB_PASSWORD").unwrap_or_default();

        // The compose file maps 5080:5080, so the server binds 5080 by default.
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5080".to_string())
            .parse()
            .expect("Invalid BIND_ADDR format");

        let media_root = env::var("MEDIA_ROOT")
            .unwrap_or_else(|_| "./media".to_string())
            .into();

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            db_host,
            db_port,
            db_name,
            db_user,
            db_password,
            bind_addr,
            media_root,
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("DB_HOST");
        env::remove_var("DB_PORT");
        env::remove_var("DB_NAME");
        env::remove_var("DB_USER");
        env::remove_var("DB_PASSWORD");
        env::remove_var("BIND_ADDR");
        env::remove_var("MEDIA_ROOT");
        env::remove_var("LOG_LEVEL");

        let config = Config::from_env();

        assert_eq!(config.db_host, "localhost");
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.db_name, "recipes");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:5080");
        assert_eq!(config.media_root, PathBuf::from("./media"));
        assert_eq!(config.log_level, "info");
    }
}
