// ABOUTME: Live-channel membership tracking and fan-out broadcast per routine id
// ABOUTME: Self-heals by dropping channels whose receiving task has gone away
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! # Connection Registry
//!
//! Tracks which live WebSocket channels are subscribed to which
//! routine's updates and fans broadcasts out to them. Each member is an
//! unbounded mpsc sender of pre-serialized frames; the socket task on
//! the other end drains it. A send failure means the task is gone, so
//! the channel is removed inside the same critical section.
//!
//! Membership maps are mutated only under the write guard with no
//! suspension points inside the critical section, so mutation is atomic
//! with respect to cooperative scheduling.

use crate::errors::AppResult;
use crate::websocket::OutboundFrame;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identity of one admitted channel
pub type ConnectionId = Uuid;

/// Sender half of one channel's outbound frame queue
pub type FrameSender = mpsc::UnboundedSender<String>;

/// Registry of live channels keyed by routine id
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<i64, HashMap<ConnectionId, FrameSender>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new channel's membership for a routine
    pub async fn admit(&self, routine_id: i64, sender: FrameSender) -> ConnectionId {
        let connection_id = Uuid::new_v4();
        let mut connections = self.connections.write().await;
        connections
            .entry(routine_id)
            .or_default()
            .insert(connection_id, sender);
        debug!(%connection_id, routine_id, "channel admitted");
        connection_id
    }

    /// Remove a channel's membership; unknown pairs are a no-op
    ///
    /// A routine whose membership set becomes empty is discarded, not
    /// leaked.
    pub async fn remove(&self, routine_id: i64, connection_id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(members) = connections.get_mut(&routine_id) {
            if members.remove(&connection_id).is_some() {
                debug!(%connection_id, routine_id, "channel removed");
            }
            if members.is_empty() {
                connections.remove(&routine_id);
            }
        }
    }

    /// Deliver a frame to every member channel of a routine
    ///
    /// Delivery is independent per channel: one failed send never
    /// prevents delivery to the others. Failing channels are presumed
    /// dead and removed. Returns the number of successful deliveries.
    ///
    /// # Errors
    ///
    /// Returns a `SerializationError` if the frame cannot be serialized.
    pub async fn publish(&self, routine_id: i64, frame: &OutboundFrame) -> AppResult<usize> {
        let text = serde_json::to_string(frame)?;

        let mut connections = self.connections.write().await;
        let Some(members) = connections.get_mut(&routine_id) else {
            return Ok(0);
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (connection_id, sender) in members.iter() {
            if sender.send(text.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*connection_id);
            }
        }

        for connection_id in dead {
            warn!(%connection_id, routine_id, "dropping dead channel during broadcast");
            members.remove(&connection_id);
        }
        if members.is_empty() {
            connections.remove(&routine_id);
        }

        Ok(delivered)
    }

    /// Number of channels currently admitted for a routine
    pub async fn connection_count(&self, routine_id: i64) -> usize {
        self.connections
            .read()
            .await
            .get(&routine_id)
            .map_or(0, HashMap::len)
    }
}
