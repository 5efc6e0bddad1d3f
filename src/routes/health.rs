// ABOUTME: Liveness endpoint reporting service status and AI capability flags
// ABOUTME: Lets deployments detect a server running without generation configured
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! Health check endpoint.

use crate::resources::ServerResources;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;

/// Health check endpoint
pub struct HealthRoutes;

/// Body of a health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server can answer at all
    pub status: &'static str,
    /// Whether routine generation is configured
    pub generation_available: bool,
    /// Whether image analysis is configured
    pub analysis_available: bool,
    /// Server time, RFC 3339
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthRoutes {
    /// Register the health endpoint
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .with_state(resources)
    }

    /// `GET /health`
    async fn health(State(resources): State<Arc<ServerResources>>) -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "ok",
            generation_available: resources.ai.generation_available(),
            analysis_available: resources.ai.analysis_available(),
            timestamp: chrono::Utc::now(),
        })
    }
}
