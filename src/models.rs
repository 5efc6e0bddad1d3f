// ABOUTME: Domain models for routines, training days, exercises, and chat messages
// ABOUTME: The Routine is the serialized unit of truth stored as one versioned blob
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! Core domain types.
//!
//! A [`Routine`] is a full workout plan for one user: an ordered sequence
//! of [`Day`] entries, each with ordered [`Exercise`] entries. The whole
//! routine is persisted as a single JSON blob under its id; every update
//! is a full-document replace.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single exercise within a training day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Exercise name
    pub name: String,
    /// Number of sets (expected >= 1)
    pub sets: u32,
    /// Rep specification, free text (e.g. "8-12")
    pub reps: String,
    /// Rest specification, free text (e.g. "60-90 sec")
    pub rest: String,
    /// Equipment label, free text
    pub equipment: String,
}

/// One training day within a routine
///
/// Position within the routine is its only identity; ordering matters
/// for weekday-like display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    /// Display label for the day (e.g. "Monday")
    pub day_name: String,
    /// Training focus label (e.g. "Chest and triceps")
    pub focus: String,
    /// Ordered exercises for this day
    pub exercises: Vec<Exercise>,
}

/// A complete workout routine for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    /// Store-assigned identity, stable after creation
    #[serde(default)]
    pub id: Option<i64>,
    /// Owning user id
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Display name
    pub routine_name: String,
    /// Ordered training days
    pub days: Vec<Day>,
    /// Creation timestamp, assigned by the store
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp, refreshed on every replace
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Routine {
    /// Validate structural invariants of a generated routine
    ///
    /// A routine persisted from generation must have at least one day;
    /// a malformed generation result fails here instead of persisting
    /// a partial document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the routine has no days.
    pub fn validate(&self) -> AppResult<()> {
        if self.days.is_empty() {
            return Err(AppError::invalid_input(
                "generated routine contains no training days",
            ));
        }
        Ok(())
    }
}

/// Sender tag for a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    /// Message typed by the user
    User,
    /// Reply produced by the assistant
    Assistant,
}

impl ChatSender {
    /// Database representation of the sender tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single chat message attached to a routine
///
/// Messages are immutable after creation and removed only via routine
/// cascade delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Store-assigned identity
    pub id: i64,
    /// Owning routine id
    pub routine_id: i64,
    /// Sender tag ("user" or "assistant")
    pub sender: String,
    /// Message text
    pub content: String,
    /// Creation timestamp (RFC 3339)
    pub timestamp: String,
}

/// Request parameters for creating a new routine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineRequest {
    /// Training goals, free text
    pub goals: String,
    /// Equipment summary, free text
    #[serde(default)]
    pub equipment: String,
    /// Number of training days per week
    pub days: u32,
    /// Experience level, free text
    #[serde(default)]
    pub experience_level: String,
    /// Available equipment detail, free text
    #[serde(default)]
    pub available_equipment: String,
    /// Time per session, free text
    #[serde(default)]
    pub time_per_session: String,
    /// Health conditions to respect, free text
    #[serde(default)]
    pub health_conditions: String,
    /// Owning user id (trusted as given)
    #[serde(default = "default_user_id")]
    pub user_id: i64,
}

/// Default user id for the single trusted user
pub(crate) const fn default_user_id() -> i64 {
    1
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn sample_day() -> Day {
        Day {
            day_name: "Monday".into(),
            focus: "Full body".into(),
            exercises: vec![Exercise {
                name: "Squat".into(),
                sets: 3,
                reps: "8-12".into(),
                rest: "90 sec".into(),
                equipment: "Barbell".into(),
            }],
        }
    }

    #[test]
    fn test_routine_with_days_validates() {
        let routine = Routine {
            id: None,
            user_id: 1,
            routine_name: "Strength block".into(),
            days: vec![sample_day()],
            created_at: None,
            updated_at: None,
        };
        assert!(routine.validate().is_ok());
    }

    #[test]
    fn test_routine_without_days_fails_validation() {
        let routine = Routine {
            id: None,
            user_id: 1,
            routine_name: "Empty".into(),
            days: Vec::new(),
            created_at: None,
            updated_at: None,
        };
        assert!(routine.validate().is_err());
    }

    #[test]
    fn test_routine_roundtrips_through_json() {
        let routine = Routine {
            id: Some(7),
            user_id: 2,
            routine_name: "Hypertrophy".into(),
            days: vec![sample_day()],
            created_at: None,
            updated_at: None,
        };
        let json = serde_json::to_string(&routine).unwrap();
        let back: Routine = serde_json::from_str(&json).unwrap();
        assert_eq!(back, routine);
    }

    #[test]
    fn test_routine_request_defaults() {
        let request: RoutineRequest =
            serde_json::from_str(r#"{"goals":"build muscle","days":3}"#).unwrap();
        assert_eq!(request.user_id, 1);
        assert_eq!(request.days, 3);
        assert!(request.equipment.is_empty());
    }

    #[test]
    fn test_chat_sender_database_tags() {
        assert_eq!(ChatSender::User.as_str(), "user");
        assert_eq!(ChatSender::Assistant.as_str(), "assistant");
    }
}
