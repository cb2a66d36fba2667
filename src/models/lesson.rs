// src/models/lesson.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::level::LessonLevel;

/// How the lesson text is presented to the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    /// Student copies the visible text.
    Text,
    /// Student types a single dictated sentence.
    AudioSentence,
    /// Student types a dictated paragraph.
    AudioParagraph,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Text => "text",
            ModuleType::AudioSentence => "audio_sentence",
            ModuleType::AudioParagraph => "audio_paragraph",
        }
    }
}

impl FromStr for ModuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ModuleType::Text),
            "audio_sentence" => Ok(ModuleType::AudioSentence),
            "audio_paragraph" => Ok(ModuleType::AudioParagraph),
            other => Err(format!("unknown module type '{}'", other)),
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the 'lessons' table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Lesson {
    pub id: i64,
    pub title: String,

    /// Reference text the student has to reproduce.
    pub content: String,

    pub level: LessonLevel,
    pub module_type: ModuleType,

    /// Playback source for audio modules (http(s) or data URL).
    pub audio_url: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Insert shape for a lesson row.
#[derive(Debug, Clone)]
pub struct NewLesson {
    pub title: String,
    pub content: String,
    pub level: LessonLevel,
    pub module_type: ModuleType,
    pub audio_url: Option<String>,
}

/// Partial update applied by the store. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct LessonChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub level: Option<LessonLevel>,
    pub module_type: Option<ModuleType>,
    pub audio_url: Option<String>,
}

impl LessonChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.level.is_none()
            && self.module_type.is_none()
            && self.audio_url.is_none()
    }
}

/// DTO for creating a lesson.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    pub level: LessonLevel,
    pub module_type: ModuleType,
    #[validate(custom(function = "validate_audio_url"))]
    pub audio_url: Option<String>,
}

/// DTO for updating a lesson. Fields are optional.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub content: Option<String>,
    pub level: Option<LessonLevel>,
    pub module_type: Option<ModuleType>,
    #[validate(custom(function = "validate_audio_url"))]
    pub audio_url: Option<String>,
}

/// Query parameters for the admin lesson listing.
#[derive(Debug, Default, Deserialize)]
pub struct LessonListParams {
    pub level: Option<LessonLevel>,
}

/// Query parameters for pulling a sample text.
#[derive(Debug, Deserialize)]
pub struct SampleTextParams {
    pub level: LessonLevel,
    pub module_type: Option<ModuleType>,
    /// Picks among the available samples; wraps around.
    pub index: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SampleTextResponse {
    pub level: LessonLevel,
    pub module_type: ModuleType,
    pub content: String,
}

/// Checks an audio source. Accepts absolute http(s) URLs and `data:audio/...` URLs.
pub fn validate_audio_url(raw: &str) -> Result<(), validator::ValidationError> {
    let parsed = url::Url::parse(raw).map_err(|_| validator::ValidationError::new("invalid_url"))?;
    match parsed.scheme() {
        "http" | "https" if raw.len() <= 500 => Ok(()),
        "http" | "https" => Err(validator::ValidationError::new("url_too_long")),
        "data" if parsed.path().starts_with("audio/") => Ok(()),
        _ => Err(validator::ValidationError::new("unsupported_audio_url")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_url_accepts_http_and_audio_data_urls() {
        assert!(validate_audio_url("https://cdn.example.com/a.mp3").is_ok());
        assert!(validate_audio_url("data:audio/mpeg;base64,AAAA").is_ok());
        assert!(validate_audio_url("data:text/html;base64,AAAA").is_err());
        assert!(validate_audio_url("ftp://example.com/a.mp3").is_err());
        assert!(validate_audio_url("not a url").is_err());
    }

    #[test]
    fn module_type_parses_snake_case() {
        assert_eq!("audio_sentence".parse::<ModuleType>(), Ok(ModuleType::AudioSentence));
        assert!("audio-sentence".parse::<ModuleType>().is_err());
    }

    #[test]
    fn empty_changes_are_detected() {
        assert!(LessonChanges::default().is_empty());
        let changes = LessonChanges {
            title: Some("New".into()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
