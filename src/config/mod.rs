use std::env;
use std::time::Duration;

use crate::preview::{PreviewSettings, DEFAULT_MAX_BODY_BYTES};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_TEMPERATURE: f32 = 0.7;

#[derive(Clone, Debug)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub openai_timeout: Duration,
    pub preview_timeout: Duration,
    pub preview_max_bytes: u64,
    pub preview_allow_private_hosts: bool,
    pub preview_allowed_hosts: Vec<String>,
    pub server_host: String,
    pub server_port: u16,
    pub is_dev: bool,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first
    /// when one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unparsable values fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Config {
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: non_empty("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_temperature: non_empty("OPENAI_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_OPENAI_TEMPERATURE),
            openai_timeout: Duration::from_secs(
                non_empty("OPENAI_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            ),
            preview_timeout: Duration::from_secs(
                non_empty("PREVIEW_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            preview_max_bytes: non_empty("PREVIEW_MAX_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            preview_allow_private_hosts: non_empty("PREVIEW_ALLOW_PRIVATE_HOSTS")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            preview_allowed_hosts: non_empty("PREVIEW_ALLOWED_HOSTS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|h| !h.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            server_host: non_empty("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: non_empty("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            is_dev: lookup("APP_ENV").as_deref() != Some("production"),
        }
    }

    pub fn preview_settings(&self) -> PreviewSettings {
        PreviewSettings {
            timeout: self.preview_timeout,
            max_body_bytes: self.preview_max_bytes,
            allow_private_hosts: self.preview_allow_private_hosts,
            exempt_hosts: self.preview_allowed_hosts.clone(),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
