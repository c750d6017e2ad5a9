use std::env;

use tracing::info;

/// Application configuration loaded from environment variables.
///
/// Everything has a sensible default; the LLM variant simply stays disabled
/// when its credentials are absent rather than failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_url: String,

    // Upstream provider
    pub provider_api_base: String,
    pub provider_timeout_secs: u64,

    // Web server
    pub host: String,
    pub port: u16,

    // Ingestion
    pub update_interval_hours: u64,
    pub window_days: i64,
    pub target_countries: Vec<String>,
    pub target_activity: String,

    // Feed
    pub feed_title: String,
    pub feed_description: String,
    pub feed_max_items: u32,

    // LLM summaries
    pub llm_enabled: bool,
    pub llm_title_enabled: bool,
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message only on malformed numeric values.
    pub fn from_env() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", "sqlite://threatwire.db?mode=rwc"),
            provider_api_base: env_or("PROVIDER_API_BASE", "https://api.ransomware.live/v2"),
            provider_timeout_secs: parsed_env("PROVIDER_TIMEOUT_SECS", 30),
            host: env_or("HOST", "0.0.0.0"),
            port: parsed_env("PORT", 8080),
            update_interval_hours: parsed_env("UPDATE_INTERVAL_HOURS", 1),
            window_days: parsed_env("WINDOW_DAYS", 7),
            target_countries: env_or("TARGET_COUNTRIES", "CN,HK,MO")
                .split(',')
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
            target_activity: env_or("TARGET_ACTIVITY", "Financial Services"),
            feed_title: env_or("FEED_TITLE", "Ransomware Threat Intelligence Feed"),
            feed_description: env_or(
                "FEED_DESCRIPTION",
                "Aggregated ransomware victim and cyberattack intelligence, \
                 filtered to target regions and industries",
            ),
            feed_max_items: parsed_env("FEED_MAX_ITEMS", 50),
            llm_enabled: parsed_env("LLM_ENABLED", false),
            llm_title_enabled: parsed_env("LLM_TITLE_ENABLED", false),
            llm_base_url: env_or("LLM_BASE_URL", ""),
            llm_api_key: env_or("LLM_API_KEY", ""),
            llm_model: env_or("LLM_MODEL", ""),
            llm_timeout_secs: parsed_env("LLM_TIMEOUT_SECS", 30),
            llm_max_tokens: parsed_env("LLM_MAX_TOKENS", 2000),
            llm_temperature: parsed_env("LLM_TEMPERATURE", 0.3),
        }
    }

    /// Whether the LLM summary variant can actually be used: enabled AND
    /// fully configured. Missing credentials disable it at startup rather
    /// than erroring at runtime.
    pub fn llm_configured(&self) -> bool {
        self.llm_enabled
            && !self.llm_api_key.is_empty()
            && !self.llm_base_url.is_empty()
            && !self.llm_model.is_empty()
    }

    /// Log the active configuration without leaking secrets.
    pub fn log_redacted(&self) {
        info!(
            database_url = %self.database_url,
            provider_api_base = %self.provider_api_base,
            update_interval_hours = self.update_interval_hours,
            window_days = self.window_days,
            target_countries = %self.target_countries.join(","),
            target_activity = %self.target_activity,
            feed_max_items = self.feed_max_items,
            llm_enabled = self.llm_configured(),
            llm_model = %self.llm_model,
            "Configuration loaded"
        );
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} has an invalid value: {raw}")),
        Err(_) => default,
    }
}
