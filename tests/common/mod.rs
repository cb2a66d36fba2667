// tests/common/mod.rs

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use serde_json::{Value, json};
use typemind::{
    config::Config,
    generation::{GenerationError, TextGenerator},
    models::level::LessonLevel,
    routes,
    speech::{
        AudioClip, SpeechError, SynthesisRequest, Synthesizer, Transcriber, http::audio_data_url,
    },
    state::AppState,
    store::{DynStore, MemoryStore},
    utils::seed::seed_admin_user,
};

pub const ADMIN_EMAIL: &str = "admin@typemind.test";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const PASSWORD: &str = "password123";

pub struct FakeTranscriber;

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, SpeechError> {
        Ok(format!("heard {} bytes of {}", clip.bytes.len(), clip.content_type))
    }
}

pub struct FakeSynthesizer;

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String, SpeechError> {
        Ok(audio_data_url(request.text.as_bytes()))
    }
}

/// Speech collaborator that behaves like an unconfigured provider.
pub struct OfflineSpeech;

#[async_trait]
impl Transcriber for OfflineSpeech {
    async fn transcribe(&self, _clip: AudioClip) -> Result<String, SpeechError> {
        Err(SpeechError::NotConfigured("transcription"))
    }
}

#[async_trait]
impl Synthesizer for OfflineSpeech {
    async fn synthesize(&self, _request: &SynthesisRequest) -> Result<String, SpeechError> {
        Err(SpeechError::NotConfigured("speech synthesis"))
    }
}

pub const GENERATED_PREFIX: &str = "Generated passage for";

pub struct FakeGenerator;

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, level: LessonLevel) -> Result<String, GenerationError> {
        Ok(format!("{} {} typists.", GENERATED_PREFIX, level))
    }
}

/// Generator that behaves like a provider without an API key.
pub struct OfflineGenerator;

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, _level: LessonLevel) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

/// External providers handed to the app under test.
pub struct Collaborators {
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub generator: Arc<dyn TextGenerator>,
}

impl Collaborators {
    pub fn fake() -> Self {
        Self {
            transcriber: Arc::new(FakeTranscriber),
            synthesizer: Arc::new(FakeSynthesizer),
            generator: Arc::new(FakeGenerator),
        }
    }

    pub fn offline() -> Self {
        Self {
            transcriber: Arc::new(OfflineSpeech),
            synthesizer: Arc::new(OfflineSpeech),
            generator: Arc::new(OfflineGenerator),
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: DynStore,
}

pub fn test_config() -> Config {
    let mut config = Config::new("memory:", "test_secret_for_integration_tests");
    config.jwt_expiration = 600;
    config.rust_log = "error".to_string();
    config.admin_email = Some(ADMIN_EMAIL.to_string());
    config.admin_password = Some(ADMIN_PASSWORD.to_string());
    config.auth_replenish_seconds = 1;
    config.auth_burst_size = 1000;
    config
}

/// Spawns the app on a random port with a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), Collaborators::fake()).await
}

pub async fn spawn_app_with(config: Config, collaborators: Collaborators) -> TestApp {
    let store: DynStore = Arc::new(MemoryStore::new());
    seed_admin_user(store.as_ref(), &config)
        .await
        .expect("Failed to seed admin");

    let state = AppState::new(
        store.clone(),
        config,
        collaborators.transcriber,
        collaborators.synthesizer,
        collaborators.generator,
    );
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    pub async fn token(&self, email: &str, password: &str) -> String {
        let body: Value = self.login(email, password).await.json().await.unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.token(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn register(&self, email: &str, full_name: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "email": email, "password": PASSWORD, "full_name": full_name }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// Registers, approves and logs in a student. Returns (id, token).
    pub async fn approved_student(&self, admin_token: &str, full_name: &str) -> (i64, String) {
        let email = format!("s_{}@typemind.test", &uuid::Uuid::new_v4().to_string()[..8]);
        let user: Value = self.register(&email, full_name).await.json().await.unwrap();
        let id = user["id"].as_i64().expect("User id missing");

        let response = self
            .put(&format!("/api/admin/users/{}/status", id), admin_token)
            .json(&json!({ "status": "approved" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        (id, self.token(&email, PASSWORD).await)
    }

    pub async fn create_lesson(&self, admin_token: &str, body: Value) -> Value {
        let response = self
            .post("/api/admin/lessons", admin_token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    pub async fn submit_session(
        &self,
        token: &str,
        lesson_id: i64,
        body: Value,
    ) -> reqwest::Response {
        self.post(&format!("/api/lessons/{}/sessions", lesson_id), token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub fn get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn put(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }
}

/// A two-second attempt. Short enough to cap the speed bonus.
pub fn attempt(input: &str) -> Value {
    json!({
        "input": input,
        "started_at": "2024-01-01T00:00:00Z",
        "finished_at": "2024-01-01T00:00:02Z"
    })
}

pub fn lesson(title: &str, content: &str, level: &str) -> Value {
    json!({
        "title": title,
        "content": content,
        "level": level,
        "module_type": "text"
    })
}
