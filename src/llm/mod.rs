// ABOUTME: External AI capability traits and the runtime injection point
// ABOUTME: Generation and image analysis are black boxes with failing request/response contracts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! # Generation and Image-Analysis Services
//!
//! The coordinator never talks to a concrete AI backend. It holds an
//! [`AiCapabilities`] value injected at startup and queries availability
//! through it; tests substitute mock implementations of the two traits.

/// Google Gemini implementation of both capability traits
pub mod gemini;

pub use gemini::GeminiProvider;

use crate::errors::{AppError, AppResult};
use crate::images::ValidatedImage;
use crate::models::{Routine, RoutineRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Generative routine service
///
/// Given a creation request or an existing routine plus a free-text
/// instruction, returns a new routine document or an explanation string.
/// Any call may fail.
#[async_trait]
pub trait RoutineGenerator: Send + Sync {
    /// Generate an initial routine from a creation request
    async fn create_initial_routine(&self, request: &RoutineRequest) -> AppResult<Routine>;

    /// Produce a modified copy of `current` according to `instruction`
    async fn modify_routine(&self, current: &Routine, instruction: &str) -> AppResult<Routine>;

    /// Describe the delta between `old` and `new` for the chat transcript
    async fn explain_changes(
        &self,
        old: &Routine,
        new: &Routine,
        instruction: &str,
    ) -> AppResult<String>;
}

/// Exercise-photo analysis service
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Analyze posture and technique in an exercise photo
    async fn analyze_exercise_image(
        &self,
        image: &ValidatedImage,
        exercise_name: Option<&str>,
    ) -> AppResult<String>;

    /// Suggest exercise variations based on an exercise photo
    async fn suggest_exercise_variations(&self, image: &ValidatedImage) -> AppResult<String>;
}

/// Explicit capability object for the external AI services
///
/// Replaces a module-level "is the AI configured" flag: availability is
/// queried through methods, and absent capabilities surface as
/// `ExternalServiceUnavailable` instead of silently degrading.
#[derive(Clone, Default)]
pub struct AiCapabilities {
    generator: Option<Arc<dyn RoutineGenerator>>,
    analyzer: Option<Arc<dyn ImageAnalyzer>>,
}

impl AiCapabilities {
    /// Create capabilities from whatever services are configured
    #[must_use]
    pub fn new(
        generator: Option<Arc<dyn RoutineGenerator>>,
        analyzer: Option<Arc<dyn ImageAnalyzer>>,
    ) -> Self {
        Self {
            generator,
            analyzer,
        }
    }

    /// Capabilities with no AI services configured
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether routine generation is configured
    #[must_use]
    pub fn generation_available(&self) -> bool {
        self.generator.is_some()
    }

    /// Whether image analysis is configured
    #[must_use]
    pub fn analysis_available(&self) -> bool {
        self.analyzer.is_some()
    }

    /// Get the routine generator
    ///
    /// # Errors
    ///
    /// Returns `ExternalServiceUnavailable` when generation is not
    /// configured.
    pub fn generator(&self) -> AppResult<&dyn RoutineGenerator> {
        self.generator
            .as_deref()
            .ok_or_else(AppError::generation_unavailable)
    }

    /// Get the image analyzer
    ///
    /// # Errors
    ///
    /// Returns `ExternalServiceUnavailable` when image analysis is not
    /// configured.
    pub fn analyzer(&self) -> AppResult<&dyn ImageAnalyzer> {
        self.analyzer.as_deref().ok_or_else(|| {
            AppError::new(
                crate::errors::ErrorCode::ExternalServiceUnavailable,
                "image analysis service is not configured",
            )
        })
    }
}
