// src/main.rs

use std::{net::SocketAddr, sync::Arc, time::Duration};

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use typemind::{
    config::Config,
    generation::HttpTextGenerator,
    routes,
    scoring::refresh_rankings,
    speech::{HttpSynthesizer, HttpTranscriber},
    state::AppState,
    store::{DynStore, MemoryStore, PgStore},
    utils::seed::seed_admin_user,
};

const MEMORY_DATABASE_PREFIX: &str = "memory:";

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store: DynStore = if config.database_url.starts_with(MEMORY_DATABASE_PREFIX) {
        tracing::warn!("Using the in-memory store; data is lost on restart.");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(PgStore::new(connect_postgres(&config).await))
    };

    if let Err(e) = seed_admin_user(store.as_ref(), &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let timeout = Duration::from_secs(config.external_timeout_secs);
    let transcriber = HttpTranscriber::new(
        config.transcription_url.as_deref(),
        config.transcription_api_key.as_deref(),
        timeout,
    )
    .expect("Failed to build transcription client");
    let synthesizer = HttpSynthesizer::new(
        config.synthesis_url.as_deref(),
        config.synthesis_api_key.as_deref(),
        config.synthesis_model.as_deref(),
        timeout,
    )
    .expect("Failed to build speech synthesis client");
    let generator = HttpTextGenerator::new(
        config.generation_url.as_deref(),
        config.generation_api_key.as_deref(),
        config.generation_model.as_deref(),
        timeout,
    )
    .expect("Failed to build text generation client");

    if !transcriber.enabled() {
        tracing::info!(
            "Transcription is not configured; /api/admin/speech/transcribe will return 503."
        );
    }
    if !synthesizer.enabled() {
        tracing::info!(
            "Speech synthesis is not configured; /api/admin/speech/synthesize will return 503."
        );
    }
    if !generator.enabled() {
        tracing::info!("Text generation is not configured; lesson drafts use built-in samples.");
    }

    let state = AppState::new(
        store,
        config.clone(),
        Arc::new(transcriber),
        Arc::new(synthesizer),
        Arc::new(generator),
    );

    // Bring stored rankings in line with the current policy version.
    match refresh_rankings(state.store.as_ref(), state.policy).await {
        Ok(outcome) => {
            tracing::info!("Rankings ready: {} students ranked.", outcome.rankings.len())
        }
        Err(e) => tracing::warn!("Initial ranking refresh failed: {}", e),
    }

    let app = routes::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listening address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}

/// Connects with retries, then applies embedded migrations.
async fn connect_postgres(config: &Config) -> sqlx::PgPool {
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected, running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    pool
}
