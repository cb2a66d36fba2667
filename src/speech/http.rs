// src/speech/http.rs

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, multipart};
use serde::{Deserialize, Serialize};

use crate::{
    speech::{AudioClip, SpeechError, SynthesisRequest, Synthesizer, Transcriber},
    utils::http::{Endpoint, client_with_timeout},
};

pub const DEFAULT_SYNTHESIS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";
pub const DEFAULT_SYNTHESIS_MODEL: &str = "eleven_monolingual_v1";

/// Speech-to-text over a multipart upload with bearer auth.
#[derive(Clone)]
pub struct HttpTranscriber {
    client: Client,
    endpoint: Option<Endpoint>,
}

impl HttpTranscriber {
    pub fn new(
        url: Option<&str>,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, SpeechError> {
        Ok(Self {
            client: client_with_timeout(timeout)?,
            endpoint: Endpoint::from_parts(url, api_key),
        })
    }

    pub fn enabled(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    text: Option<String>,
    transcription: Option<String>,
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, SpeechError> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or(SpeechError::NotConfigured("transcription"))?;

        let part = multipart::Part::bytes(clip.bytes)
            .file_name(clip.file_name)
            .mime_str(&clip.content_type)
            .map_err(|e| SpeechError::InvalidInput(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&endpoint.url)
            .bearer_auth(&endpoint.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Transcription provider returned {}", response.status());
            return Err(SpeechError::HttpStatus(response.status()));
        }

        let body: TranscriptionBody = response.json().await?;
        Ok(body.text.or(body.transcription).unwrap_or_default())
    }
}

/// Text-to-speech over a JSON POST to `{base}/{voice_id}`.
#[derive(Clone)]
pub struct HttpSynthesizer {
    client: Client,
    endpoint: Option<Endpoint>,
    model: String,
}

impl HttpSynthesizer {
    pub fn new(
        url: Option<&str>,
        api_key: Option<&str>,
        model: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, SpeechError> {
        Ok(Self {
            client: client_with_timeout(timeout)?,
            endpoint: Endpoint::from_parts(
                Some(url.unwrap_or(DEFAULT_SYNTHESIS_URL)),
                api_key,
            ),
            model: model.unwrap_or(DEFAULT_SYNTHESIS_MODEL).to_string(),
        })
    }

    pub fn enabled(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[derive(Debug, Serialize)]
struct ProviderRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    speed: f32,
}

pub fn audio_data_url(bytes: &[u8]) -> String {
    format!(
        "data:audio/mpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String, SpeechError> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or(SpeechError::NotConfigured("speech synthesis"))?;

        let payload = ProviderRequest {
            text: &request.text,
            model_id: &self.model,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
                speed: request.speed,
            },
        };

        let response = self
            .client
            .post(format!("{}/{}", endpoint.url, request.voice_id))
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &endpoint.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Speech synthesis provider returned {}", response.status());
            return Err(SpeechError::HttpStatus(response.status()));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(SpeechError::EmptyResponse);
        }

        Ok(audio_data_url(&audio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_is_base64_mpeg() {
        assert_eq!(audio_data_url(b"abc"), "data:audio/mpeg;base64,YWJj");
    }

    #[tokio::test]
    async fn unconfigured_clients_report_not_configured() {
        let transcriber = HttpTranscriber::new(None, None, Duration::from_secs(1)).unwrap();
        assert!(!transcriber.enabled());
        let err = transcriber
            .transcribe(AudioClip {
                bytes: vec![1, 2, 3],
                file_name: "clip.webm".to_string(),
                content_type: "audio/webm".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::NotConfigured(_)));

        let synthesizer = HttpSynthesizer::new(None, None, None, Duration::from_secs(1)).unwrap();
        assert!(!synthesizer.enabled());
        let err = synthesizer
            .synthesize(&SynthesisRequest {
                text: "hello".to_string(),
                voice_id: "voice".to_string(),
                speed: 1.0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::NotConfigured(_)));
    }
}
