// src/handlers/speech.rs

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    speech::{AudioClip, SynthesisRequest, SynthesisResponse, TranscriptionResponse},
    state::AppState,
};

/// Largest accepted upload for transcription.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct TranscribeParams {
    pub file_name: Option<String>,
}

fn audio_content_type(headers: &HeaderMap) -> Result<String, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase())
        .ok_or_else(|| AppError::BadRequest("Content-Type header is required".to_string()))?;

    if content_type.starts_with("audio/") || content_type == "application/octet-stream" {
        Ok(content_type)
    } else {
        Err(AppError::BadRequest(format!(
            "Unsupported content type '{}'; send raw audio bytes",
            content_type
        )))
    }
}

/// Transcribes a dictation recording. The request body is the raw audio.
#[utoipa::path(
    post,
    path = "/api/admin/speech/transcribe",
    tag = "speech",
    security(("bearer" = [])),
    params(
        ("file_name" = Option<String>, Query,
            description = "Original file name, forwarded to the provider"),
    ),
    request_body(content = Vec<u8>, content_type = "audio/*"),
    responses(
        (status = 200, body = TranscriptionResponse),
        (status = 400, description = "Missing or non-audio body"),
        (status = 503, description = "Transcription unavailable"),
    )
)]
pub async fn transcribe(
    State(state): State<AppState>,
    Query(params): Query<TranscribeParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let content_type = audio_content_type(&headers)?;
    if body.is_empty() {
        return Err(AppError::BadRequest("Audio file is required".to_string()));
    }

    let clip = AudioClip {
        bytes: body.to_vec(),
        file_name: params.file_name.unwrap_or_else(|| "recording".to_string()),
        content_type,
    };

    let transcript = state.transcriber.transcribe(clip).await?;
    Ok(Json(TranscriptionResponse { transcript }))
}

/// Generates dictation audio for a lesson.
#[utoipa::path(
    post,
    path = "/api/admin/speech/synthesize",
    tag = "speech",
    security(("bearer" = [])),
    request_body = SynthesisRequest,
    responses(
        (status = 200, body = SynthesisResponse),
        (status = 400, description = "Validation failed"),
        (status = 503, description = "Speech synthesis unavailable"),
    )
)]
pub async fn synthesize(
    State(state): State<AppState>,
    Json(payload): Json<SynthesisRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let audio_url = state.synthesizer.synthesize(&payload).await?;
    Ok(Json(SynthesisResponse { audio_url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn only_audio_bodies_are_accepted() {
        let mut headers = HeaderMap::new();
        assert!(audio_content_type(&headers).is_err());

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/webm"));
        assert_eq!(audio_content_type(&headers).unwrap(), "audio/webm");

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(audio_content_type(&headers).is_err());
    }
}
