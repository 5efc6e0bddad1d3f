// ABOUTME: Database operations for routine documents stored as versioned JSON blobs
// ABOUTME: Handles create, full-document replace, lookup, listing, and cascade delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::Routine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// Summary of a routine for the listing view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineSummary {
    /// Routine id
    pub id: i64,
    /// Display name
    pub routine_name: String,
    /// Last-update timestamp (RFC 3339)
    pub updated_at: String,
}

impl Database {
    /// Create the routines table
    pub(super) async fn migrate_routines(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS routines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                routine_name TEXT NOT NULL,
                routine_data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_routines_user_id ON routines(user_id)")
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Persist a new routine and assign it a fresh id
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` on storage fault or a
    /// `SerializationError` if the routine cannot be serialized.
    pub async fn create_routine(&self, routine: &Routine, owner_id: i64) -> AppResult<i64> {
        let now = Utc::now().to_rfc3339();
        let routine_data = serde_json::to_string(routine)?;

        let result = sqlx::query(
            r"
            INSERT INTO routines (user_id, routine_name, routine_data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ",
        )
        .bind(owner_id)
        .bind(&routine.routine_name)
        .bind(&routine_data)
        .bind(&now)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to create routine: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    /// Replace the document stored under `routine_id` with the full new
    /// routine content and a refreshed updated-timestamp
    ///
    /// The overwrite is a single UPDATE statement, so concurrent readers
    /// never observe a half-written document.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the id does not exist, or a
    /// `DatabaseError` on storage fault.
    pub async fn replace_routine(&self, routine_id: i64, routine: &Routine) -> AppResult<i64> {
        let now = Utc::now().to_rfc3339();
        let routine_data = serde_json::to_string(routine)?;

        let result = sqlx::query(
            r"
            UPDATE routines
            SET routine_name = $1, routine_data = $2, updated_at = $3
            WHERE id = $4
            ",
        )
        .bind(&routine.routine_name)
        .bind(&routine_data)
        .bind(&now)
        .bind(routine_id)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to replace routine: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Routine {routine_id}")));
        }

        Ok(routine_id)
    }

    /// Get the full current document for a routine id
    ///
    /// Returns `None` for an unknown id; "not found" is never an error
    /// here.
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` on storage fault or a
    /// `SerializationError` if the stored blob cannot be parsed.
    pub async fn get_routine(&self, routine_id: i64) -> AppResult<Option<Routine>> {
        let row = sqlx::query(
            r"
            SELECT user_id, routine_data, created_at, updated_at
            FROM routines
            WHERE id = $1
            ",
        )
        .bind(routine_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to get routine: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let routine_data: String = row.get("routine_data");
        let mut routine: Routine = serde_json::from_str(&routine_data)?;

        // The row is authoritative for identity and timestamps; the blob
        // may predate both.
        routine.id = Some(routine_id);
        routine.user_id = row.get("user_id");
        routine.created_at = parse_timestamp(&row.get::<String, _>("created_at"));
        routine.updated_at = parse_timestamp(&row.get::<String, _>("updated_at"));

        Ok(Some(routine))
    }

    /// List routine summaries for an owner, most recently updated first
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` on storage fault.
    pub async fn list_routines_by_owner(&self, owner_id: i64) -> AppResult<Vec<RoutineSummary>> {
        let rows = sqlx::query(
            r"
            SELECT id, routine_name, updated_at
            FROM routines
            WHERE user_id = $1
            ORDER BY updated_at DESC
            ",
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to list routines: {e}")))?;

        let summaries = rows
            .into_iter()
            .map(|r| RoutineSummary {
                id: r.get("id"),
                routine_name: r.get("routine_name"),
                updated_at: r.get("updated_at"),
            })
            .collect();

        Ok(summaries)
    }

    /// Delete a routine and, via cascade, all its chat messages
    ///
    /// Returns whether a row was actually removed.
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` on storage fault.
    pub async fn delete_routine(&self, routine_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM routines WHERE id = $1")
            .bind(routine_id)
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("failed to delete routine: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Parse an RFC 3339 timestamp stored by this module
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
