// ABOUTME: Database management for routine documents and chat transcripts
// ABOUTME: Owns the SQLite pool, schema migration, and identity assignment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! # Routine Document Store
//!
//! Persists routine documents and chat transcripts in SQLite. The store
//! exclusively owns persisted state: callers hold only request-scoped
//! copies that they read, mutate in memory, and write back as a full
//! document replace. Every write is durable before the call returns.

mod chat;
mod routines;

pub use chat::ChatHistoryEntry;
pub use routines::RoutineSummary;

use crate::errors::AppResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database manager for routines and chat messages
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid, the pool
    /// cannot be created, or schema migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(crate::errors::AppError::from)?
            .create_if_missing(true)
            .foreign_keys(true);

        // SQLite in-memory databases are per-connection; a single pooled
        // connection keeps every query on the same database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the underlying pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_routines().await?;
        self.migrate_chat().await?;
        Ok(())
    }
}
