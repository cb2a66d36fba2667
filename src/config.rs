// src/config.rs

use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    /// Allowed browser origins. Empty means the local dev defaults.
    pub cors_origins: Vec<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Seconds until one auth request token is replenished.
    pub auth_replenish_seconds: u64,
    pub auth_burst_size: u32,
    pub transcription_url: Option<String>,
    pub transcription_api_key: Option<String>,
    pub synthesis_url: Option<String>,
    pub synthesis_api_key: Option<String>,
    pub synthesis_model: Option<String>,
    pub generation_url: Option<String>,
    pub generation_api_key: Option<String>,
    pub generation_model: Option<String>,
    pub external_timeout_secs: u64,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{} is invalid: {}", key, e)),
        None => default,
    }
}

impl Config {
    /// Defaults for everything except the two required values.
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration: 86_400,
            rust_log: "info".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cors_origins: Vec::new(),
            admin_email: None,
            admin_password: None,
            auth_replenish_seconds: 2,
            auth_burst_size: 5,
            transcription_url: None,
            transcription_api_key: None,
            synthesis_url: None,
            synthesis_api_key: None,
            synthesis_model: None,
            generation_url: None,
            generation_api_key: None,
            generation_model: None,
            external_timeout_secs: 30,
        }
    }

    /// Reads the process environment (and `.env`). Panics on missing
    /// required values or unparsable numbers.
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let defaults = Self::new(database_url, jwt_secret);

        let cors_origins = optional("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            jwt_expiration: parsed("JWT_EXPIRATION", defaults.jwt_expiration),
            rust_log: optional("RUST_LOG").unwrap_or_else(|| defaults.rust_log.clone()),
            bind_addr: parsed("BIND_ADDR", defaults.bind_addr),
            cors_origins,
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
            auth_replenish_seconds: parsed(
                "AUTH_REPLENISH_SECONDS",
                defaults.auth_replenish_seconds,
            )
            .max(1),
            auth_burst_size: parsed("AUTH_BURST_SIZE", defaults.auth_burst_size).max(1),
            transcription_url: optional("TRANSCRIPTION_URL"),
            transcription_api_key: optional("TRANSCRIPTION_API_KEY"),
            synthesis_url: optional("SYNTHESIS_URL"),
            synthesis_api_key: optional("SYNTHESIS_API_KEY"),
            synthesis_model: optional("SYNTHESIS_MODEL"),
            generation_url: optional("GENERATION_URL"),
            generation_api_key: optional("GENERATION_API_KEY"),
            generation_model: optional("GENERATION_MODEL"),
            external_timeout_secs: parsed("EXTERNAL_TIMEOUT_SECS", defaults.external_timeout_secs)
                .max(1),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_optional_settings() {
        let config = Config::new("postgres://localhost/typemind", "secret");
        assert_eq!(config.jwt_expiration, 86_400);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.auth_burst_size, 5);
        assert!(config.cors_origins.is_empty());
        assert!(config.synthesis_api_key.is_none());
        assert!(config.generation_api_key.is_none());
    }
}
