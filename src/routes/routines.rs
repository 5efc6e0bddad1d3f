// ABOUTME: REST endpoints for routine lifecycle: create, modify, list, fetch, delete
// ABOUTME: The modify endpoint is the HTTP fallback mirroring the streaming chat path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! # Routine REST Endpoints
//!
//! `POST /api/modify_routine/:id` is the request/response fallback for
//! the streaming channel: it runs the identical coordinator sequence
//! but answers only its caller, with no registry fan-out.
//! `/api/routine/modify/:id` is a compatibility alias for older
//! clients.

use crate::database::ChatHistoryEntry;
use crate::errors::{AppError, AppResult};
use crate::models::{Routine, RoutineRequest};
use crate::resources::ServerResources;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Routine lifecycle endpoints
pub struct RoutineRoutes;

/// Body of a modify request
#[derive(Debug, Deserialize)]
pub struct ModifyRequest {
    /// Natural-language edit instruction
    pub message: String,
}

/// Response to a successful creation
#[derive(Debug, Serialize)]
pub struct CreateResponse {
    /// Persistent id of the new routine
    pub routine_id: i64,
    /// The generated document
    pub routine: Routine,
}

/// Response to a successful modification
#[derive(Debug, Serialize)]
pub struct ModifyResponse {
    /// The full replacement document
    pub routine: Routine,
    /// Assistant explanation of the change
    pub explanation: String,
}

/// Full routine detail with its chat transcript
#[derive(Debug, Serialize)]
pub struct RoutineDetail {
    /// The current document
    pub routine: Routine,
    /// Transcript, timestamp-ascending
    pub chat_history: Vec<ChatHistoryEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default = "crate::models::default_user_id")]
    user_id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteForm {
    routine_id: i64,
}

impl RoutineRoutes {
    /// Register the routine endpoints
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/create_routine", post(Self::create))
            .route("/api/modify_routine/:id", post(Self::modify))
            .route("/api/routine/modify/:id", post(Self::modify))
            .route("/api/routines", get(Self::list))
            .route("/api/routines/:id", get(Self::fetch))
            .route("/delete_routine", post(Self::delete))
            .with_state(resources)
    }

    /// `POST /api/create_routine`
    async fn create(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RoutineRequest>,
    ) -> AppResult<Json<CreateResponse>> {
        let (routine_id, routine) = resources.coordinator.create_routine(&request).await?;
        Ok(Json(CreateResponse {
            routine_id,
            routine,
        }))
    }

    /// `POST /api/modify_routine/:id` (and its alias)
    ///
    /// Answers only the caller; live subscribers are not notified.
    async fn modify(
        State(resources): State<Arc<ServerResources>>,
        Path(routine_id): Path<i64>,
        Json(request): Json<ModifyRequest>,
    ) -> AppResult<Json<ModifyResponse>> {
        if request.message.trim().is_empty() {
            return Err(AppError::invalid_input("message must not be empty"));
        }

        let update = resources
            .coordinator
            .apply_chat_edit(routine_id, &request.message)
            .await?;

        Ok(Json(ModifyResponse {
            routine: update.routine,
            explanation: update.explanation,
        }))
    }

    /// `GET /api/routines?user_id=`
    async fn list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListQuery>,
    ) -> AppResult<Json<serde_json::Value>> {
        let routines = resources
            .database
            .list_routines_by_owner(query.user_id)
            .await?;
        Ok(Json(serde_json::json!({ "routines": routines })))
    }

    /// `GET /api/routines/:id`
    ///
    /// Returns the full document together with its chat transcript, as
    /// one dashboard payload.
    async fn fetch(
        State(resources): State<Arc<ServerResources>>,
        Path(routine_id): Path<i64>,
    ) -> AppResult<Json<RoutineDetail>> {
        let routine = resources
            .database
            .get_routine(routine_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Routine {routine_id}")))?;
        let chat_history = resources.database.get_chat_history(routine_id).await?;
        Ok(Json(RoutineDetail {
            routine,
            chat_history,
        }))
    }

    /// `POST /delete_routine` (form-encoded, browser-facing)
    ///
    /// Deleting an absent routine is a no-op; the redirect is issued
    /// either way.
    async fn delete(
        State(resources): State<Arc<ServerResources>>,
        Form(form): Form<DeleteForm>,
    ) -> AppResult<Redirect> {
        let removed = resources.database.delete_routine(form.routine_id).await?;
        if !removed {
            warn!(routine_id = form.routine_id, "delete requested for absent routine");
        }
        Ok(Redirect::to("/routines?success=true&action=delete"))
    }
}
