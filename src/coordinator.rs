// ABOUTME: Orchestration core resolving mutation requests into persisted updates
// ABOUTME: Drives load -> generate -> persist -> notify for chat edits and image analysis
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! # Routine Update Coordinator
//!
//! One state machine per mutation request, identical for the streaming
//! channel and the HTTP fallback endpoint:
//!
//! `RECEIVED -> ROUTINE_LOOKED_UP -> GENERATING -> PERSISTING -> NOTIFIED`
//!
//! with failure exits at each step. The inbound user message is persisted
//! *before* generation runs, so history reflects causally-ordered input
//! even when generation fails; that partial success is by design and is
//! never rolled back. The coordinator holds only request-scoped state:
//! every request re-reads the routine from the store, and concurrent
//! mutations of the same routine id resolve last-write-wins at the store
//! layer.

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::images::validate_image_payload;
use crate::llm::AiCapabilities;
use crate::models::{ChatSender, Routine, RoutineRequest};
use tracing::{info, warn};

/// Fallback assistant reply when explanation generation fails
const FALLBACK_EXPLANATION: &str =
    "I have updated your routine as requested. Check the main panel to see the changes.";

/// Assistant reply when image analysis is not configured
const ANALYSIS_UNAVAILABLE: &str =
    "Sorry, image analysis is currently unavailable because the AI service is not configured.";

/// Result of a successful chat edit
#[derive(Debug, Clone)]
pub struct RoutineUpdate {
    /// The full replacement document, with identity preserved
    pub routine: Routine,
    /// Assistant explanation of the delta
    pub explanation: String,
}

/// Which image analysis to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAction {
    /// Evaluate posture and technique
    AnalyzeForm,
    /// Suggest exercise variations
    SuggestVariations,
}

/// An inbound image-analysis request
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Base64 payload, bare or as a `data:` URL
    pub image_data: String,
    /// Exercise name for context, if the client knows it
    pub exercise_name: Option<String>,
    /// Requested analysis
    pub action: ImageAction,
}

/// The orchestration core shared by both entry points
#[derive(Clone)]
pub struct RoutineCoordinator {
    database: Database,
    ai: AiCapabilities,
}

impl RoutineCoordinator {
    /// Create a coordinator over the store and the injected capabilities
    #[must_use]
    pub const fn new(database: Database, ai: AiCapabilities) -> Self {
        Self { database, ai }
    }

    /// The injected AI capabilities
    #[must_use]
    pub const fn ai(&self) -> &AiCapabilities {
        &self.ai
    }

    /// Generate and persist a brand-new routine
    ///
    /// Seeds the opening chat exchange as a best-effort side write.
    ///
    /// # Errors
    ///
    /// Returns `ExternalServiceUnavailable` when generation is not
    /// configured (nothing is persisted), `InvalidInput`/`InvalidFormat`
    /// when generation produced a malformed document, or a
    /// `DatabaseError` on storage fault.
    pub async fn create_routine(&self, request: &RoutineRequest) -> AppResult<(i64, Routine)> {
        let generator = self.ai.generator()?;

        let mut routine = generator.create_initial_routine(request).await?;
        routine.validate()?;

        let routine_id = self.database.create_routine(&routine, request.user_id).await?;
        routine.id = Some(routine_id);

        info!(routine_id, user_id = request.user_id, "routine created");

        // Opening chat exchange is non-critical; the routine row is the
        // unit of truth.
        let opening = format!(
            "I want a routine for {} training {} days per week.",
            request.goals, request.days
        );
        if let Err(e) = self
            .seed_opening_exchange(routine_id, &opening)
            .await
        {
            warn!(routine_id, error = %e, "failed to seed opening chat exchange");
        }

        Ok((routine_id, routine))
    }

    async fn seed_opening_exchange(&self, routine_id: i64, opening: &str) -> AppResult<()> {
        self.database
            .append_chat_message(routine_id, ChatSender::User, opening)
            .await?;
        self.database
            .append_chat_message(
                routine_id,
                ChatSender::Assistant,
                "I have created a personalized routine for you! You can see it in the main panel.",
            )
            .await?;
        Ok(())
    }

    /// Resolve a chat-edit instruction against the current document
    ///
    /// The identical sequence backs the streaming channel and the HTTP
    /// fallback; only the notification step differs (the caller decides
    /// whether to broadcast the result).
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown routine id,
    /// `ExternalServiceError` when generation fails (the already-appended
    /// user message is kept), or a `DatabaseError` when persisting the
    /// replacement fails (nothing should be broadcast in that case).
    pub async fn apply_chat_edit(&self, routine_id: i64, message: &str) -> AppResult<RoutineUpdate> {
        let current = self
            .database
            .get_routine(routine_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Routine {routine_id}")))?;

        // Persist the user's message before invoking generation so the
        // transcript stays causally ordered even if generation fails.
        self.database
            .append_chat_message(routine_id, ChatSender::User, message)
            .await?;

        let generator = self.ai.generator()?;
        let mut modified = generator.modify_routine(&current, message).await?;
        // A structurally invalid document here is the generator's fault,
        // not the caller's, so it surfaces as an upstream failure.
        modified.validate().map_err(|e| {
            AppError::external_service("generation", format!("modified routine rejected: {}", e.message))
        })?;
        modified.id = Some(routine_id);
        modified.user_id = current.user_id;

        // Explanation is best-effort: its failure degrades to a generic
        // reply instead of failing the whole edit.
        let explanation = match generator.explain_changes(&current, &modified, message).await {
            Ok(text) => text,
            Err(e) => {
                warn!(routine_id, error = %e, "explanation generation failed, using fallback");
                FALLBACK_EXPLANATION.to_owned()
            }
        };

        self.database.replace_routine(routine_id, &modified).await?;
        self.database
            .append_chat_message(routine_id, ChatSender::Assistant, &explanation)
            .await?;

        info!(routine_id, "routine updated from chat edit");

        Ok(RoutineUpdate {
            routine: modified,
            explanation,
        })
    }

    /// Resolve an image-analysis request
    ///
    /// Rejected payloads (oversized or undecodable) and an unconfigured
    /// analyzer produce user-facing text results; the analysis service is
    /// never invoked for them. The resulting text is appended to the
    /// transcript as an assistant message. The routine document itself is
    /// never mutated on this path.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown routine id,
    /// `ExternalServiceError` when the analysis call fails, or a
    /// `DatabaseError` on storage fault.
    pub async fn analyze_image(&self, routine_id: i64, request: &ImageRequest) -> AppResult<String> {
        if self.database.get_routine(routine_id).await?.is_none() {
            return Err(AppError::not_found(format!("Routine {routine_id}")));
        }

        let analysis = match validate_image_payload(&request.image_data) {
            Err(rejection) => rejection.user_message().to_owned(),
            Ok(image) => {
                if self.ai.analysis_available() {
                    let analyzer = self.ai.analyzer()?;
                    match request.action {
                        ImageAction::AnalyzeForm => {
                            analyzer
                                .analyze_exercise_image(&image, request.exercise_name.as_deref())
                                .await?
                        }
                        ImageAction::SuggestVariations => {
                            analyzer.suggest_exercise_variations(&image).await?
                        }
                    }
                } else {
                    ANALYSIS_UNAVAILABLE.to_owned()
                }
            }
        };

        self.database
            .append_chat_message(routine_id, ChatSender::Assistant, &analysis)
            .await?;

        Ok(analysis)
    }
}
