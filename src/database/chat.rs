// ABOUTME: Database operations for per-routine chat transcripts
// ABOUTME: Messages are append-only and removed only via routine cascade delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::ChatSender;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// One entry of a routine's chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    /// Sender tag ("user" or "assistant")
    pub sender: String,
    /// Message text
    pub content: String,
}

impl Database {
    /// Create the chat_messages table
    pub(super) async fn migrate_chat(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                routine_id INTEGER NOT NULL REFERENCES routines(id) ON DELETE CASCADE,
                sender TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_routine_id ON chat_messages(routine_id)",
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Append one chat message to a routine's transcript
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` on storage fault (including an unknown
    /// routine id, rejected by the foreign key).
    pub async fn append_chat_message(
        &self,
        routine_id: i64,
        sender: ChatSender,
        content: &str,
    ) -> AppResult<i64> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            INSERT INTO chat_messages (routine_id, sender, content, timestamp)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(routine_id)
        .bind(sender.as_str())
        .bind(content)
        .bind(&now)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to append chat message: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    /// Get the full chat history for a routine, timestamp-ascending
    ///
    /// The id tie-break keeps ordering stable for messages appended
    /// within the same timestamp.
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` on storage fault.
    pub async fn get_chat_history(&self, routine_id: i64) -> AppResult<Vec<ChatHistoryEntry>> {
        let rows = sqlx::query(
            r"
            SELECT sender, content
            FROM chat_messages
            WHERE routine_id = $1
            ORDER BY timestamp ASC, id ASC
            ",
        )
        .bind(routine_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("failed to get chat history: {e}")))?;

        let entries = rows
            .into_iter()
            .map(|r| ChatHistoryEntry {
                sender: r.get("sender"),
                content: r.get("content"),
            })
            .collect();

        Ok(entries)
    }
}
