// src/generation/mod.rs

//! Lesson text authoring. A chat-completion provider writes a fresh passage;
//! the built-in samples in `crate::content` stand in when it cannot.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::level::LessonLevel;

pub use http::HttpTextGenerator;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("text generation is not configured")]
    NotConfigured,
    #[error("text generation provider returned an empty response")]
    EmptyResponse,
    #[error("text generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns a trimmed, non-empty passage sized for `level`.
    async fn generate(&self, level: LessonLevel) -> Result<String, GenerationError>;
}

pub type DynTextGenerator = Arc<dyn TextGenerator>;

/// How long the passage should be. Mixed-level lessons get the intermediate size.
pub fn length_guide(level: LessonLevel) -> &'static str {
    match level {
        LessonLevel::Beginner => "short sentence (10-15 words)",
        LessonLevel::Intermediate | LessonLevel::All => "medium paragraph (30-50 words)",
        LessonLevel::Advanced => "long paragraph (60-100 words)",
    }
}

pub fn prompt_for(level: LessonLevel) -> String {
    format!(
        "Generate a {} about healthcare terminology and medical procedures. \
         The text should be suitable for typing practice and include proper medical \
         vocabulary. Make it educational and professionally written.",
        length_guide(level)
    )
}

/// DTO for drafting a lesson passage.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateTextRequest {
    pub level: LessonLevel,
    /// Sample to fall back on, wraps around. Defaults to the first.
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Generated,
    Sample,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedText {
    pub level: LessonLevel,
    pub content: String,
    pub source: TextSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_level_asks_for_a_medium_paragraph() {
        assert_eq!(length_guide(LessonLevel::All), length_guide(LessonLevel::Intermediate));
        assert!(prompt_for(LessonLevel::Advanced).starts_with("Generate a long paragraph"));
    }

    #[test]
    fn request_index_is_optional() {
        let req: GenerateTextRequest =
            serde_json::from_value(serde_json::json!({"level": "beginner"})).unwrap();
        assert_eq!(req.level, LessonLevel::Beginner);
        assert_eq!(req.index, None);
    }
}
