use anyhow::Context;
use std::env;

/// Process configuration loaded once at startup. The signing secret is
/// mandatory: the process refuses to start rather than fall back to a
/// guessable default.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .context("JWT_SECRET must be set; refusing to start without a signing secret")?;
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("PORT") {
            Ok(value) => value.parse::<u16>().context("PORT must be a valid port number")?,
            Err(_) => 8080,
        };
        let cors_origin = env::var("CORS_ORIGIN").ok();

        Ok(Self {
            jwt_secret,
            host,
            port,
            cors_origin,
        })
    }
}
