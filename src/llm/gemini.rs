// ABOUTME: Google Gemini implementation of routine generation and image analysis
// ABOUTME: Talks to the Generative Language REST API and extracts structured JSON replies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! # Gemini Provider
//!
//! Implements [`RoutineGenerator`] and [`ImageAnalyzer`] against Google's
//! Gemini models. Configure with the `GEMINI_API_KEY` environment
//! variable; override the model with `GEMINI_MODEL`.
//!
//! Routine documents are requested as strict JSON. The model frequently
//! wraps its reply in a fenced code block, so extraction tries a
//! ```` ```json ```` block first and falls back to parsing the whole
//! reply.

use std::env;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{ImageAnalyzer, RoutineGenerator};
use crate::errors::{AppError, AppResult};
use crate::images::ValidatedImage;
use crate::models::{Routine, RoutineRequest};

/// Environment variable for the Gemini API key
const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable for overriding the model
const GEMINI_MODEL_ENV: &str = "GEMINI_MODEL";

/// Default model; multimodal, so it serves both text and image requests
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Base URL for the Gemini API
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Gemini API request structure
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

/// Content structure for the Gemini API
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

/// Part of content (text or inline image data)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    /// Text content
    Text { text: String },
    /// Inline binary data (base64-encoded image)
    InlineData {
        #[serde(rename = "inline_data")]
        inline_data: InlineData,
    },
}

/// Base64-encoded inline payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Gemini API response structure
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

/// Response candidate
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

/// API error response from Gemini
#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Google Gemini provider for routine generation and image analysis
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    model: String,
}

impl GeminiProvider {
    /// Create a new provider with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            model: DEFAULT_MODEL.to_owned(),
        }
    }

    /// Create a provider from the `GEMINI_API_KEY` environment variable
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the environment variable is not set.
    pub fn from_env() -> AppResult<Self> {
        let api_key = env::var(GEMINI_API_KEY_ENV).map_err(|_| {
            AppError::config(format!("{GEMINI_API_KEY_ENV} environment variable not set"))
        })?;
        let mut provider = Self::new(api_key);
        if let Ok(model) = env::var(GEMINI_MODEL_ENV) {
            provider.model = model;
        }
        Ok(provider)
    }

    /// Set a custom model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send one request and return the concatenated candidate text
    async fn generate(&self, parts: Vec<ContentPart>) -> AppResult<String> {
        let url = format!(
            "{API_BASE_URL}/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_owned()),
                parts,
            }],
        };

        debug!(model = %self.model, "sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::external_service("Gemini", format!("request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("Gemini", format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            error!(status = %status, "Gemini API returned an error status");
            return Err(AppError::external_service(
                "Gemini",
                format!("API returned status {status}"),
            ));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service("Gemini", format!("unparseable response: {e}"))
        })?;

        if let Some(api_error) = parsed.error {
            return Err(AppError::external_service("Gemini", api_error.message));
        }

        let text = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text),
                ContentPart::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(AppError::external_service(
                "Gemini",
                "response contained no text candidates",
            ));
        }

        Ok(text)
    }

    /// Send a text-only request
    async fn generate_text(&self, prompt: String) -> AppResult<String> {
        self.generate(vec![ContentPart::Text { text: prompt }]).await
    }

    /// Send a multimodal request carrying one inline image
    async fn generate_with_image(&self, prompt: String, image: &ValidatedImage) -> AppResult<String> {
        self.generate(vec![
            ContentPart::Text { text: prompt },
            ContentPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.format.mime_type().to_owned(),
                    data: image.to_base64(),
                },
            },
        ])
        .await
    }

    fn build_initial_prompt(request: &RoutineRequest) -> String {
        format!(
            r#"Act as a professional personal trainer and create a detailed workout routine with these characteristics:

Goals: {goals}
Training days: {days} days per week
Experience level: {experience}
Available equipment: {equipment}
Time per session: {time}
Health conditions: {health}

The routine must follow STRICTLY this JSON format:

{{
    "routine_name": "Descriptive routine name",
    "days": [
        {{
            "day_name": "Monday",
            "focus": "Body part trained that day",
            "exercises": [
                {{
                    "name": "Exercise name",
                    "sets": 3,
                    "reps": "8-12",
                    "rest": "60-90 sec",
                    "equipment": "Required equipment"
                }}
            ]
        }}
    ]
}}

IMPORTANT:
1. Return ONLY valid JSON, no explanatory text.
2. Include exactly {days} days in the routine."#,
            goals = request.goals,
            days = request.days,
            experience = or_unspecified(&request.experience_level),
            equipment = or_unspecified(&request.available_equipment),
            time = or_unspecified(&request.time_per_session),
            health = if request.health_conditions.is_empty() {
                "None"
            } else {
                &request.health_conditions
            },
        )
    }

    fn build_modification_prompt(current: &Routine, instruction: &str) -> AppResult<String> {
        let routine_json = serde_json::to_string(current)?;
        Ok(format!(
            "Act as a personal trainer. The user has the following workout routine:\n\n\
             ```json\n{routine_json}\n```\n\n\
             The user has requested: \"{instruction}\"\n\n\
             Modify the routine according to this request and return ONLY the updated JSON."
        ))
    }

    fn build_explanation_prompt(instruction: &str) -> String {
        format!(
            "The user requested: \"{instruction}\"\n\n\
             Briefly explain the changes made to the routine in a professional and \
             motivating tone. Do not include JSON, only text describing the main changes."
        )
    }

    fn build_form_analysis_prompt(exercise_name: Option<&str>) -> String {
        exercise_name.map_or_else(
            || {
                "Analyze this photo of a person exercising.\n\n\
                 Please:\n\
                 1. Identify which exercise they are performing\n\
                 2. Evaluate their posture and technique\n\
                 3. Give specific tips for improvement\n\
                 4. Mention the benefits of the exercise and muscles worked\n\n\
                 Answer clearly and concisely."
                    .to_owned()
            },
            |name| {
                format!(
                    "Analyze this photo where the person is performing the exercise: {name}.\n\n\
                     Please provide:\n\
                     1. An evaluation of their posture and technique\n\
                     2. Specific points to improve\n\
                     3. Tips for better exercise form\n\
                     4. Possible injury risks based on the technique shown\n\n\
                     Answer clearly and concisely."
                )
            },
        )
    }

    fn build_variations_prompt() -> String {
        "Look at this exercise photo and suggest 4-5 alternative variations that work \
         the same muscle groups.\n\n\
         For each variation include:\n\
         - Exercise name\n\
         - Brief description of how to perform it\n\
         - Required equipment (if any)\n\
         - Whether it is easier or harder than the exercise shown\n\n\
         Answer clearly and concisely."
            .to_owned()
    }

    /// Extract a JSON document from a model reply
    ///
    /// Tries a fenced code block first, then the whole trimmed text.
    fn extract_json_document(text: &str) -> AppResult<serde_json::Value> {
        static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
        let fence = FENCE.get_or_init(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").ok());

        let candidate = fence
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map_or_else(|| text.trim(), |m| m.as_str());

        serde_json::from_str(candidate).map_err(|e| {
            AppError::invalid_format(format!("model reply is not valid JSON: {e}"))
        })
    }

    /// Parse and validate a routine document from a model reply
    fn parse_routine_reply(text: &str, user_id: i64, id: Option<i64>) -> AppResult<Routine> {
        let value = Self::extract_json_document(text)?;
        let mut routine: Routine = serde_json::from_value(value)
            .map_err(|e| AppError::invalid_format(format!("model reply has wrong shape: {e}")))?;

        routine.validate()?;
        routine.user_id = user_id;
        routine.id = id;

        Ok(routine)
    }
}

fn or_unspecified(value: &str) -> &str {
    if value.is_empty() {
        "Not specified"
    } else {
        value
    }
}

#[async_trait]
impl RoutineGenerator for GeminiProvider {
    async fn create_initial_routine(&self, request: &RoutineRequest) -> AppResult<Routine> {
        let prompt = Self::build_initial_prompt(request);
        let reply = self.generate_text(prompt).await?;
        Self::parse_routine_reply(&reply, request.user_id, None)
    }

    async fn modify_routine(&self, current: &Routine, instruction: &str) -> AppResult<Routine> {
        let prompt = Self::build_modification_prompt(current, instruction)?;
        let reply = self.generate_text(prompt).await?;
        // A modification that comes back unparseable is a generation
        // failure, not a client input problem.
        Self::parse_routine_reply(&reply, current.user_id, current.id).map_err(|e| {
            AppError::external_service("Gemini", format!("modified routine rejected: {e}"))
        })
    }

    async fn explain_changes(
        &self,
        _old: &Routine,
        _new: &Routine,
        instruction: &str,
    ) -> AppResult<String> {
        let reply = self
            .generate_text(Self::build_explanation_prompt(instruction))
            .await?;
        Ok(reply.trim().to_owned())
    }
}

#[async_trait]
impl ImageAnalyzer for GeminiProvider {
    async fn analyze_exercise_image(
        &self,
        image: &ValidatedImage,
        exercise_name: Option<&str>,
    ) -> AppResult<String> {
        let prompt = Self::build_form_analysis_prompt(exercise_name);
        let reply = self.generate_with_image(prompt, image).await?;
        Ok(reply.trim().to_owned())
    }

    async fn suggest_exercise_variations(&self, image: &ValidatedImage) -> AppResult<String> {
        let reply = self
            .generate_with_image(Self::build_variations_prompt(), image)
            .await?;
        Ok(reply.trim().to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fenced_block() {
        let text = "Here is your routine:\n```json\n{\"routine_name\":\"X\",\"days\":[]}\n```";
        let value = GeminiProvider::extract_json_document(text).unwrap();
        assert_eq!(value["routine_name"], "X");
    }

    #[test]
    fn test_extract_json_from_bare_text() {
        let text = "  {\"routine_name\":\"Y\",\"days\":[]}  ";
        let value = GeminiProvider::extract_json_document(text).unwrap();
        assert_eq!(value["routine_name"], "Y");
    }

    #[test]
    fn test_extract_json_rejects_prose() {
        assert!(GeminiProvider::extract_json_document("sorry, no JSON here").is_err());
    }

    #[test]
    fn test_parse_routine_reply_requires_days() {
        let text = r#"{"routine_name":"Empty","days":[]}"#;
        assert!(GeminiProvider::parse_routine_reply(text, 1, None).is_err());
    }

    #[test]
    fn test_parse_routine_reply_reattaches_identity() {
        let text = r#"```json
        {"routine_name":"Push/Pull","days":[{"day_name":"Monday","focus":"Push","exercises":[]}]}
        ```"#;
        let routine = GeminiProvider::parse_routine_reply(text, 7, Some(3)).unwrap();
        assert_eq!(routine.user_id, 7);
        assert_eq!(routine.id, Some(3));
        assert_eq!(routine.days.len(), 1);
    }
}
