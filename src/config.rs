//! Runtime settings
//!
//! Loaded from the process environment (and `.env` when present).
//! Collaborators are built from these settings at startup; nothing reads
//! the environment afterwards.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::llm::gemini::DEFAULT_BASE_URL as DEFAULT_GEMINI_BASE_URL;
use crate::models::{DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};

#[derive(Debug, Clone)]
pub struct Settings {
    /// Upper bound on a single worker run before it is recorded as an error.
    pub worker_timeout: Duration,
    /// Artificial delay injected into the built-in data workers.
    pub simulated_latency: Duration,
    pub default_lookback_days: u32,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub news_api_key: Option<String>,
    pub news_api_base_url: String,
    pub port: u16,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            worker_timeout: Duration::from_secs(120),
            simulated_latency: Duration::ZERO,
            default_lookback_days: DEFAULT_LOOKBACK_DAYS,
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            news_api_key: None,
            news_api_base_url: "https://newsapi.org/v2".to_string(),
            port: 8080,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout_secs: u64 = parse_or(&lookup, "AGENT_TIMEOUT_SECONDS", 120);
        let latency_ms: u64 = parse_or(&lookup, "SIMULATED_LATENCY_MS", 0);

        let mut default_lookback_days =
            parse_or(&lookup, "DEFAULT_TIMEFRAME_DAYS", DEFAULT_LOOKBACK_DAYS);
        if !(1..=MAX_LOOKBACK_DAYS).contains(&default_lookback_days) {
            warn!(
                value = default_lookback_days,
                "DEFAULT_TIMEFRAME_DAYS out of range, using default"
            );
            default_lookback_days = DEFAULT_LOOKBACK_DAYS;
        }

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Invalid PORT, using default");
                defaults.port
            }),
            None => defaults.port,
        };

        Self {
            worker_timeout: Duration::from_secs(timeout_secs.max(1)),
            simulated_latency: Duration::from_millis(latency_ms),
            default_lookback_days,
            gemini_api_key: non_empty(lookup("GEMINI_API_KEY")),
            gemini_model: non_empty(lookup("GEMINI_MODEL")).unwrap_or(defaults.gemini_model),
            gemini_base_url: non_empty(lookup("GEMINI_BASE_URL"))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini_base_url),
            news_api_key: non_empty(lookup("NEWS_API_KEY")),
            news_api_base_url: non_empty(lookup("NEWS_API_BASE_URL"))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.news_api_base_url),
            port,
            log_level: non_empty(lookup("LOG_LEVEL"))
                .map(|level| level.to_lowercase())
                .unwrap_or(defaults.log_level),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Unparseable setting, using default");
            default
        }),
        None => default,
    }
}
