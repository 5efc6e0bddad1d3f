// ABOUTME: HTTP and WebSocket route modules for the routine server
// ABOUTME: Each submodule exposes a unit struct with a routes() constructor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! Route registration, one unit struct per surface area.

pub mod health;
pub mod routines;
pub mod websocket;

pub use health::HealthRoutes;
pub use routines::RoutineRoutes;
pub use websocket::WebSocketRoutes;

use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;

/// Assemble the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(RoutineRoutes::routes(resources.clone()))
        .merge(WebSocketRoutes::routes(resources))
}
