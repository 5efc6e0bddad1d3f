// ABOUTME: Environment-variable driven server configuration with sensible defaults
// ABOUTME: Covers HTTP port, database URL, and logging level for the routine server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! Server configuration loaded from the environment.
//!
//! | Variable       | Default             | Purpose                      |
//! |----------------|---------------------|------------------------------|
//! | `HTTP_PORT`    | `8000`              | HTTP listen port             |
//! | `DATABASE_URL` | `sqlite:gymkit.db`  | SQLite connection string     |
//! | `LOG_LEVEL`    | `info`              | Default tracing filter level |

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Default HTTP port when `HTTP_PORT` is unset
const DEFAULT_HTTP_PORT: u16 = 8000;

/// Default SQLite database location
const DEFAULT_DATABASE_URL: &str = "sqlite:gymkit.db";

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection string
    pub url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `HTTP_PORT` is set but not a valid port
    /// number.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|e| {
                AppError::config(format!("invalid HTTP_PORT value {raw:?}: {e}"))
            })?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let url = env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());

        Ok(Self {
            http_port,
            database: DatabaseConfig { url },
            log_level,
        })
    }

    /// One-line configuration summary for startup logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} database_url={} log_level={}",
            self.http_port, self.database.url, self.log_level
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // Only assert the hardcoded defaults; the environment of the test
        // runner may legitimately override them.
        assert_eq!(DEFAULT_HTTP_PORT, 8000);
        assert_eq!(DEFAULT_DATABASE_URL, "sqlite:gymkit.db");
    }

    #[test]
    fn test_summary_contains_port() {
        let config = ServerConfig {
            http_port: 9999,
            database: DatabaseConfig {
                url: "sqlite::memory:".into(),
            },
            log_level: "debug".into(),
        };
        assert!(config.summary().contains("9999"));
        assert!(config.summary().contains("sqlite::memory:"));
    }
}
