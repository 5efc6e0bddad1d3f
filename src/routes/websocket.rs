// ABOUTME: WebSocket upgrade endpoint binding a connection to one routine id
// ABOUTME: Hands accepted sockets to the session loop in crate::websocket
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! Streaming channel endpoint. The routine id in the path scopes the
//! connection; it is not verified at upgrade time, so a subscription to
//! an absent routine simply never receives frames until the first
//! request against it fails with a not-found error.

use crate::resources::ServerResources;
use crate::websocket::handle_socket;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// WebSocket upgrade endpoint
pub struct WebSocketRoutes;

impl WebSocketRoutes {
    /// Register the streaming endpoint
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/ws/chat/:routine_id", get(Self::upgrade))
            .with_state(resources)
    }

    /// `GET /ws/chat/:routine_id`
    async fn upgrade(
        State(resources): State<Arc<ServerResources>>,
        Path(routine_id): Path<i64>,
        ws: WebSocketUpgrade,
    ) -> Response {
        ws.on_upgrade(move |socket| handle_socket(socket, routine_id, resources))
    }
}
