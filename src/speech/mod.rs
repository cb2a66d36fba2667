// src/speech/mod.rs

//! Speech collaborators used while authoring audio lessons. Neither is on
//! the scoring path: a failure here only affects the admin helper endpoints.

pub mod http;

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub use http::{HttpSynthesizer, HttpTranscriber};

/// Errors emitted by the speech services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpeechError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("invalid speech input: {0}")]
    InvalidInput(String),
    #[error("speech provider returned an empty response")]
    EmptyResponse,
    #[error("speech provider request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Uploaded audio handed to a transcriber.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Returns the transcript, possibly empty if no speech was detected.
    async fn transcribe(&self, clip: AudioClip) -> Result<String, SpeechError>;
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Returns the generated audio as a `data:audio/mpeg;base64,...` URL.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String, SpeechError>;
}

pub type DynTranscriber = Arc<dyn Transcriber>;
pub type DynSynthesizer = Arc<dyn Synthesizer>;

static VOICE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("voice id pattern is valid")
});

fn validate_voice_id(voice_id: &str) -> Result<(), ValidationError> {
    if VOICE_ID.is_match(voice_id) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_voice_id"))
    }
}

fn default_speed() -> f32 {
    1.0
}

/// DTO for text-to-speech generation.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct SynthesisRequest {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Text must be between 1 and 5000 characters."
    ))]
    pub text: String,
    #[validate(custom(function = "validate_voice_id"))]
    pub voice_id: String,
    /// Playback rate. 1.0 is normal speed.
    #[serde(default = "default_speed")]
    #[validate(range(min = 0.7, max = 1.2))]
    pub speed: f32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SynthesisResponse {
    pub audio_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TranscriptionResponse {
    pub transcript: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(voice_id: &str, speed: f32) -> SynthesisRequest {
        SynthesisRequest {
            text: "Check the pulse.".to_string(),
            voice_id: voice_id.to_string(),
            speed,
        }
    }

    #[test]
    fn voice_id_must_be_a_plain_token() {
        assert!(request("21m00Tcm4TlvDq8ikWAM", 1.0).validate().is_ok());
        assert!(request("../admin", 1.0).validate().is_err());
        assert!(request("", 1.0).validate().is_err());
    }

    #[test]
    fn speed_is_bounded() {
        assert!(request("voice", 0.5).validate().is_err());
        assert!(request("voice", 1.2).validate().is_ok());
    }

    #[test]
    fn speed_defaults_to_normal() {
        let req: SynthesisRequest =
            serde_json::from_value(serde_json::json!({"text": "hi", "voice_id": "v1"})).unwrap();
        assert_eq!(req.speed, 1.0);
    }
}
