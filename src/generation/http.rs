// src/generation/http.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    generation::{GenerationError, TextGenerator, prompt_for},
    models::level::LessonLevel,
    utils::http::{Endpoint, client_with_timeout},
};

pub const DEFAULT_GENERATION_URL: &str = "https://api.abacus.ai/v0/chat";
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4";

const MAX_TOKENS: u32 = 200;
const TEMPERATURE: f32 = 0.7;

/// Chat-completion client with bearer auth.
#[derive(Clone)]
pub struct HttpTextGenerator {
    client: Client,
    endpoint: Option<Endpoint>,
    model: String,
}

impl HttpTextGenerator {
    pub fn new(
        url: Option<&str>,
        api_key: Option<&str>,
        model: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            client: client_with_timeout(timeout)?,
            endpoint: Endpoint::from_parts(
                Some(url.unwrap_or(DEFAULT_GENERATION_URL)),
                api_key,
            ),
            model: model.unwrap_or(DEFAULT_GENERATION_MODEL).to_string(),
        })
    }

    pub fn enabled(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 1],
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// First choice's content, trimmed. Blank replies count as empty.
fn first_reply(body: ChatResponse) -> Result<String, GenerationError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, level: LessonLevel) -> Result<String, GenerationError> {
        let endpoint = self.endpoint.as_ref().ok_or(GenerationError::NotConfigured)?;

        let prompt = prompt_for(level);
        let payload = ChatRequest {
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&endpoint.url)
            .bearer_auth(&endpoint.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Text generation provider returned {}", response.status());
            return Err(GenerationError::HttpStatus(response.status()));
        }

        first_reply(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(body: serde_json::Value) -> Result<String, GenerationError> {
        first_reply(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn reply_content_is_trimmed() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "  Check vitals.\n"}}]
        });
        assert_eq!(reply(body).unwrap(), "Check vitals.");
    }

    #[test]
    fn blank_or_missing_reply_is_empty() {
        let blank = serde_json::json!({"choices": [{"message": {"content": "   "}}]});
        assert!(matches!(reply(blank), Err(GenerationError::EmptyResponse)));
        assert!(matches!(reply(serde_json::json!({})), Err(GenerationError::EmptyResponse)));
    }

    #[test]
    fn request_body_matches_chat_shape() {
        let payload = ChatRequest {
            messages: [ChatMessage {
                role: "user",
                content: "hi",
            }],
            model: DEFAULT_GENERATION_MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["max_tokens"], 200);
    }

    #[tokio::test]
    async fn missing_key_reports_not_configured() {
        let generator = HttpTextGenerator::new(None, None, None, Duration::from_secs(1)).unwrap();
        assert!(!generator.enabled());
        let err = generator.generate(LessonLevel::Beginner).await.unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured));
    }
}
