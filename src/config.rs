// src/config.rs
use anyhow::{Context, Result, anyhow};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image-preview";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 120;
const DEFAULT_GEMINI_MAX_SOURCE_DIMENSION: u32 = 2048;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 8192;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub max_source_dimension: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub gemini: GeminiConfig,
    pub max_upload_bytes: usize,
    pub max_image_dimension: u32,
    pub session_idle_timeout: Duration,
    pub session_sweep_interval: Duration,
}

impl Config {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            log::info!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("GEMINI_API_KEY").ok_or_else(|| anyhow!("GEMINI_API_KEY must be set"))?;

        Ok(Self {
            bind_addr: get("RESTYLER_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            gemini: GeminiConfig {
                api_key,
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: get("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                request_timeout: Duration::from_secs(parse_or(
                    get("GEMINI_TIMEOUT_SECS"),
                    "GEMINI_TIMEOUT_SECS",
                    DEFAULT_GEMINI_TIMEOUT_SECS,
                )?),
                max_source_dimension: parse_or(
                    get("GEMINI_MAX_SOURCE_DIMENSION"),
                    "GEMINI_MAX_SOURCE_DIMENSION",
                    DEFAULT_GEMINI_MAX_SOURCE_DIMENSION,
                )?,
            },
            max_upload_bytes: parse_or(
                get("RESTYLER_MAX_UPLOAD_BYTES"),
                "RESTYLER_MAX_UPLOAD_BYTES",
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            max_image_dimension: parse_or(
                get("RESTYLER_MAX_IMAGE_DIMENSION"),
                "RESTYLER_MAX_IMAGE_DIMENSION",
                DEFAULT_MAX_IMAGE_DIMENSION,
            )?,
            session_idle_timeout: Duration::from_secs(positive_secs(
                get("RESTYLER_SESSION_IDLE_SECS"),
                "RESTYLER_SESSION_IDLE_SECS",
                DEFAULT_SESSION_IDLE_SECS,
            )?),
            session_sweep_interval: Duration::from_secs(positive_secs(
                get("RESTYLER_SESSION_SWEEP_SECS"),
                "RESTYLER_SESSION_SWEEP_SECS",
                DEFAULT_SESSION_SWEEP_SECS,
            )?),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

fn positive_secs(value: Option<String>, key: &str, default: u64) -> Result<u64> {
    match parse_or(value, key, default)? {
        0 => Err(anyhow!("{} must be greater than zero", key)),
        secs => Ok(secs),
    }
}
