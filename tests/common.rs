// ABOUTME: Shared test fixtures: in-memory resources and mock AI capabilities
// ABOUTME: Provides builders for routines, requests, and instrumented mock providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use anyhow::Result;
use async_trait::async_trait;
use gymkit::database::Database;
use gymkit::errors::{AppError, AppResult};
use gymkit::images::ValidatedImage;
use gymkit::llm::{AiCapabilities, ImageAnalyzer, RoutineGenerator};
use gymkit::models::{Day, Exercise, Routine, RoutineRequest};
use gymkit::resources::ServerResources;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Build a valid routine document with the given number of days
pub fn sample_routine(name: &str, day_count: usize) -> Routine {
    let days = (0..day_count)
        .map(|i| Day {
            day_name: format!("Day {}", i + 1),
            focus: "Full body".to_owned(),
            exercises: vec![Exercise {
                name: "Squat".to_owned(),
                sets: 3,
                reps: "8-12".to_owned(),
                rest: "90 sec".to_owned(),
                equipment: "Barbell".to_owned(),
            }],
        })
        .collect();
    Routine {
        id: None,
        user_id: 1,
        routine_name: name.to_owned(),
        days,
        created_at: None,
        updated_at: None,
    }
}

/// Build a creation request with sensible defaults
pub fn sample_request(goals: &str, days: u32) -> RoutineRequest {
    RoutineRequest {
        goals: goals.to_owned(),
        equipment: "Dumbbells".to_owned(),
        days,
        experience_level: "intermediate".to_owned(),
        available_equipment: "Dumbbells, bench".to_owned(),
        time_per_session: "45 min".to_owned(),
        health_conditions: String::new(),
        user_id: 1,
    }
}

/// Instrumented generator returning canned routines
#[derive(Default)]
pub struct MockGenerator {
    /// Calls to any generation method
    pub calls: AtomicUsize,
    /// Make `modify_routine` fail with an external service error
    pub fail_modify: AtomicBool,
    /// Make `explain_changes` fail with an external service error
    pub fail_explain: AtomicBool,
    /// Make `create_initial_routine` return a routine with no days
    pub produce_empty: AtomicBool,
    /// Make `modify_routine` return a routine with no days
    pub modify_empty: AtomicBool,
}

#[async_trait]
impl RoutineGenerator for MockGenerator {
    async fn create_initial_routine(&self, request: &RoutineRequest) -> AppResult<Routine> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let day_count = if self.produce_empty.load(Ordering::SeqCst) {
            0
        } else {
            request.days as usize
        };
        let mut routine = sample_routine("Generated routine", day_count);
        routine.user_id = request.user_id;
        Ok(routine)
    }

    async fn modify_routine(&self, current: &Routine, _message: &str) -> AppResult<Routine> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_modify.load(Ordering::SeqCst) {
            return Err(AppError::external_service("mock", "generation failed"));
        }
        let mut modified = current.clone();
        modified.routine_name = format!("{} (edited)", current.routine_name);
        if self.modify_empty.load(Ordering::SeqCst) {
            modified.days.clear();
        }
        Ok(modified)
    }

    async fn explain_changes(
        &self,
        _old: &Routine,
        _new: &Routine,
        _message: &str,
    ) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_explain.load(Ordering::SeqCst) {
            return Err(AppError::external_service("mock", "explanation failed"));
        }
        Ok("I renamed your routine.".to_owned())
    }
}

/// Instrumented analyzer returning canned analysis text
#[derive(Default)]
pub struct MockAnalyzer {
    /// Calls to any analysis method
    pub calls: AtomicUsize,
    /// Make analysis fail with an external service error
    pub fail: AtomicBool,
}

#[async_trait]
impl ImageAnalyzer for MockAnalyzer {
    async fn analyze_exercise_image(
        &self,
        _image: &ValidatedImage,
        exercise_name: Option<&str>,
    ) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_service("mock", "analysis failed"));
        }
        Ok(format!(
            "Form analysis for {}",
            exercise_name.unwrap_or("unknown exercise")
        ))
    }

    async fn suggest_exercise_variations(&self, _image: &ValidatedImage) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_service("mock", "analysis failed"));
        }
        Ok("Try incline and decline variations.".to_owned())
    }
}

/// The mock handles a test keeps for assertions
pub struct MockAi {
    pub generator: Arc<MockGenerator>,
    pub analyzer: Arc<MockAnalyzer>,
}

/// Build capabilities backed by instrumented mocks
pub fn mock_capabilities() -> (AiCapabilities, MockAi) {
    let generator = Arc::new(MockGenerator::default());
    let analyzer = Arc::new(MockAnalyzer::default());
    let ai = AiCapabilities::new(Some(generator.clone()), Some(analyzer.clone()));
    (ai, MockAi {
        generator,
        analyzer,
    })
}

/// Resources over an in-memory database with mock AI capabilities
pub async fn create_test_resources() -> Result<(Arc<ServerResources>, MockAi)> {
    let database = Database::new("sqlite::memory:").await?;
    let (ai, mocks) = mock_capabilities();
    Ok((Arc::new(ServerResources::new(database, ai)), mocks))
}

/// Resources with no AI capabilities configured
pub async fn create_disabled_resources() -> Result<Arc<ServerResources>> {
    let database = Database::new("sqlite::memory:").await?;
    Ok(Arc::new(ServerResources::new(
        database,
        AiCapabilities::disabled(),
    )))
}

/// A small valid PNG payload, base64-encoded
pub fn png_payload() -> String {
    use base64::Engine as _;
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 32]);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// A base64 payload whose decoded size exceeds the acceptance limit
pub fn oversized_payload() -> String {
    use base64::Engine as _;
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(gymkit::images::MAX_IMAGE_BYTES + 1, 0);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
