use anyhow::{Context, Result};

const DEFAULT_LLM_API_BASE: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
///
/// The LLM credential is optional here: a missing key is reported per request
/// as a pipeline failure, not as a startup error.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub llm_api_base: String,
    pub port: u16,
    pub rust_log: String,
    /// `APP_ENV=development` exposes internal error traces in responses.
    pub diagnostics: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            llm_api_base: optional_env("LLM_API_BASE")
                .unwrap_or_else(|| DEFAULT_LLM_API_BASE.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            diagnostics: is_development(std::env::var("APP_ENV").ok().as_deref()),
        })
    }
}

/// Blank values count as unset so an empty `OPENAI_API_KEY=` line in `.env`
/// behaves the same as a missing one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_development(app_env: Option<&str>) -> bool {
    matches!(app_env.map(str::trim), Some(env) if env.eq_ignore_ascii_case("development"))
}
