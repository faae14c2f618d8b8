//! Configuration module for the exam-prep backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for service authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Principals granted the admin role at startup
    pub admin_principals: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("EXAMPREP_API_PSK").ok();

        let db_path = env::var("EXAMPREP_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let bind_addr = env::var("EXAMPREP_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid EXAMPREP_BIND_ADDR format");

        let log_level = env::var("EXAMPREP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admin_principals = env::var("EXAMPREP_ADMIN_PRINCIPALS")
            .map(|raw| {
                raw.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            admin_principals,
        }
    }
}
