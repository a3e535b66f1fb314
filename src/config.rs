use anyhow::Context;
use tracing::warn;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub max_attempts: u32,
    pub port: u16,
}

impl AppConfig {
    /// Reads configuration from the process environment (after `.env` has been loaded).
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;
        Self::from_lookup(api_key, |key| std::env::var(key).ok())
    }

    fn from_lookup(api_key: String, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        if api_key.trim().is_empty() {
            anyhow::bail!("GEMINI_API_KEY is empty");
        }
        let api_base = lookup("GEMINI_API_BASE")
            .map(|v| v.trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = lookup("GEMINI_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let max_attempts = parse_or(&lookup, "GEMINI_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS).max(1);
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT);

        Ok(Self { api_key, api_base, model, max_attempts, port })
    }

    pub fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent?key={}", self.api_base, self.model, self.api_key)
    }
}

fn parse_or<T: std::str::FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("⚠️ Ignoring unparseable {}={:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}
