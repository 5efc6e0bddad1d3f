// ABOUTME: Streaming channel protocol for live routine sessions
// ABOUTME: Defines the inbound/outbound frame types and the per-socket session loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! # Streaming Channel
//!
//! Each connection is scoped to a single routine id taken from the
//! endpoint path. Inbound text frames are decoded once into
//! [`InboundFrame`]; any frame without a recognized tag is treated as
//! a plain chat message, so clients may send raw text without JSON
//! wrapping. A recognized tag with an unusable payload is answered
//! with an error frame and never reaches the chat path. Frames are
//! processed one at a time per connection, in arrival order.
//!
//! Results that change shared state (routine updates, image analysis)
//! are broadcast to every subscriber of the routine, the sender
//! included. Errors go only to the connection that caused them.

use crate::coordinator::{ImageAction, ImageRequest};
use crate::models::Routine;
use crate::registry::FrameSender;
use crate::resources::ServerResources;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Server-to-client frames
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Keepalive reply, sent only to the pinging connection
    Pong,
    /// A persisted routine replacement, broadcast to all subscribers
    RoutineUpdate {
        /// The full replacement document
        routine: Routine,
        /// Assistant explanation of the change
        explanation: String,
    },
    /// Image analysis text, broadcast to all subscribers
    ImageAnalysis {
        /// The analysis result
        analysis: String,
    },
}

/// Per-connection error frame, never broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorFrame {
    /// Human-readable failure description
    pub error: String,
}

/// Client-to-server frames, decoded once per inbound text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Keepalive probe
    Ping,
    /// Image analysis request
    AnalyzeImage(ImageFrame),
    /// A recognized control tag whose payload does not parse
    Malformed {
        /// What was wrong with the payload
        error: String,
    },
    /// Anything else is a chat edit instruction
    Chat(String),
}

/// Payload of a tagged `analyze_image` frame
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageFrame {
    /// Base64 image payload, bare or as a `data:` URL
    pub image_data: String,
    /// Exercise name for context
    #[serde(default)]
    pub exercise_name: Option<String>,
    /// `"analyze_form"` (or absence) selects form analysis; any other
    /// value selects variation suggestions
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Deserialize)]
struct FrameTag {
    #[serde(rename = "type")]
    kind: String,
}

impl InboundFrame {
    /// Decode a text frame in two steps: tag first, then payload
    ///
    /// Input without a recognized tag degrades to `Chat`; a recognized
    /// tag with an unusable payload is `Malformed`, never a chat edit.
    #[must_use]
    pub fn decode(text: &str) -> Self {
        let Ok(tag) = serde_json::from_str::<FrameTag>(text) else {
            return Self::Chat(text.to_owned());
        };
        match tag.kind.as_str() {
            "ping" => Self::Ping,
            "analyze_image" => match serde_json::from_str::<ImageFrame>(text) {
                Ok(frame) => Self::AnalyzeImage(frame),
                Err(e) => Self::Malformed {
                    error: format!("invalid analyze_image frame: {e}"),
                },
            },
            _ => Self::Chat(text.to_owned()),
        }
    }
}

impl ImageFrame {
    fn into_request(self) -> ImageRequest {
        let action = match self.action.as_deref() {
            Some("analyze_form") | None => ImageAction::AnalyzeForm,
            Some(_) => ImageAction::SuggestVariations,
        };
        ImageRequest {
            image_data: self.image_data,
            exercise_name: self.exercise_name,
            action,
        }
    }
}

/// Serialize a frame and queue it on one connection's send channel
fn send_direct<T: Serialize>(tx: &FrameSender, frame: &T) {
    match serde_json::to_string(frame) {
        // A send error means the connection is gone; the registry
        // prunes it on the next publish.
        Ok(text) => drop(tx.send(text)),
        Err(e) => warn!(error = %e, "failed to serialize outbound frame"),
    }
}

/// Run the session loop for one accepted socket
///
/// Registers the connection for the routine's broadcasts, forwards
/// queued frames to the sink from a dedicated task, and processes
/// inbound frames sequentially until the client disconnects.
pub async fn handle_socket(socket: WebSocket, routine_id: i64, resources: Arc<ServerResources>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let connection_id = resources.registry.admit(routine_id, tx.clone()).await;
    info!(routine_id, %connection_id, "websocket connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    handle_text_frame(&resources, routine_id, &text, &tx).await;
                }
                Some(Ok(Message::Binary(_))) => {
                    send_direct(&tx, &ErrorFrame {
                        error: "binary frames are not supported".to_owned(),
                    });
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // transport-level ping/pong
                Some(Err(e)) => {
                    debug!(routine_id, error = %e, "websocket read error");
                    break;
                }
            },
            _ = &mut send_task => break,
        }
    }

    send_task.abort();
    resources.registry.remove(routine_id, connection_id).await;
    info!(routine_id, %connection_id, "websocket disconnected");
}

/// Process one inbound text frame
///
/// Pong replies and errors go only to `tx`; routine updates and image
/// analyses are broadcast through the registry so every subscriber of
/// the routine converges on the same state.
pub async fn handle_text_frame(
    resources: &ServerResources,
    routine_id: i64,
    text: &str,
    tx: &FrameSender,
) {
    match InboundFrame::decode(text) {
        InboundFrame::Ping => send_direct(tx, &OutboundFrame::Pong),
        InboundFrame::AnalyzeImage(frame) => {
            let request = frame.into_request();
            match resources.coordinator.analyze_image(routine_id, &request).await {
                Ok(analysis) => {
                    broadcast(resources, routine_id, &OutboundFrame::ImageAnalysis { analysis })
                        .await;
                }
                Err(e) => send_direct(tx, &ErrorFrame { error: e.message }),
            }
        }
        InboundFrame::Malformed { error } => send_direct(tx, &ErrorFrame { error }),
        InboundFrame::Chat(message) => {
            match resources.coordinator.apply_chat_edit(routine_id, &message).await {
                Ok(update) => {
                    broadcast(
                        resources,
                        routine_id,
                        &OutboundFrame::RoutineUpdate {
                            routine: update.routine,
                            explanation: update.explanation,
                        },
                    )
                    .await;
                }
                Err(e) => send_direct(tx, &ErrorFrame { error: e.message }),
            }
        }
    }
}

async fn broadcast(resources: &ServerResources, routine_id: i64, frame: &OutboundFrame) {
    match resources.registry.publish(routine_id, frame).await {
        Ok(delivered) => debug!(routine_id, delivered, "frame broadcast"),
        Err(e) => warn!(routine_id, error = %e, "broadcast failed"),
    }
}
