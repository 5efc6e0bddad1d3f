// ABOUTME: Centralized server resource management for dependency injection
// ABOUTME: Groups the store, AI capabilities, registry, and coordinator behind one Arc
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! Shared server resources, constructed once at startup and cloned as a
//! single `Arc` into every route handler.

use crate::coordinator::RoutineCoordinator;
use crate::database::Database;
use crate::llm::AiCapabilities;
use crate::registry::ConnectionRegistry;
use std::sync::Arc;

/// Everything a request handler needs, behind one allocation
pub struct ServerResources {
    /// Routine and chat persistence
    pub database: Database,
    /// Injected generation and analysis capabilities
    pub ai: AiCapabilities,
    /// Live streaming connections, keyed by routine id
    pub registry: Arc<ConnectionRegistry>,
    /// The mutation state machine shared by every entry point
    pub coordinator: RoutineCoordinator,
}

impl ServerResources {
    /// Assemble the resource set from its independently-constructed parts
    #[must_use]
    pub fn new(database: Database, ai: AiCapabilities) -> Self {
        let coordinator = RoutineCoordinator::new(database.clone(), ai.clone());
        Self {
            database,
            ai,
            registry: Arc::new(ConnectionRegistry::default()),
            coordinator,
        }
    }
}
