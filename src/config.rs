use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing::warn;
use url::Url;

pub const DEFAULT_LLM_API_BASE: &str = "http://localhost:11434/v1";
pub const DEFAULT_LLM_API_KEY: &str = "ollama";
pub const DEFAULT_LLM_MODEL: &str = "llama3";
pub const DEFAULT_LLM_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;

/// Resolved chat-completion endpoint settings used for a single call.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        LlmSettings {
            base_url: DEFAULT_LLM_API_BASE.to_string(),
            api_key: DEFAULT_LLM_API_KEY.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout_seconds: DEFAULT_LLM_TIMEOUT_SECONDS,
            temperature: DEFAULT_LLM_TEMPERATURE,
        }
    }
}

/// Per-request endpoint fields supplied by a caller. Blank fields are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmOverride {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

fn first_non_blank(candidate: Option<&str>, fallback: &str) -> String {
    candidate
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

impl LlmSettings {
    pub fn merged(&self, overrides: &LlmOverride) -> LlmSettings {
        LlmSettings {
            base_url: first_non_blank(overrides.base_url.as_deref(), &self.base_url),
            api_key: first_non_blank(overrides.api_key.as_deref(), &self.api_key),
            model: first_non_blank(overrides.model.as_deref(), &self.model),
            timeout_seconds: self.timeout_seconds,
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingPaths {
    pub mappings: PathBuf,
    pub styles: Option<PathBuf>,
    pub anime_mappings: PathBuf,
}

impl Default for MappingPaths {
    fn default() -> Self {
        MappingPaths {
            mappings: PathBuf::from("static/mappings/mappings_main.json"),
            styles: Some(PathBuf::from("static/mappings/mappings_styles.json")),
            anime_mappings: PathBuf::from("static/mappings/mappings_acgn.json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: PathBuf,
    pub llm: LlmSettings,
    pub mapping_paths: MappingPaths,
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_optional_path(name: &str, default: &str) -> Option<PathBuf> {
    let value = env_string(name, default);
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

fn validate_api_base(value: &str) -> Result<String> {
    let trimmed = value.trim();
    let parsed =
        Url::parse(trimmed).map_err(|err| anyhow!("LLM_API_BASE '{}' is invalid: {}", trimmed, err))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(anyhow!(
            "LLM_API_BASE must use http or https, got '{}'",
            other
        )),
    }
}

fn normalize_timeout(seconds: u64) -> u64 {
    if seconds == 0 {
        warn!(
            "LLM_TIMEOUT must be positive; defaulting to {} seconds.",
            DEFAULT_LLM_TIMEOUT_SECONDS
        );
        return DEFAULT_LLM_TIMEOUT_SECONDS;
    }
    seconds
}

impl Config {
    pub fn load() -> Result<Self> {
        let base_url = validate_api_base(&env_string("LLM_API_BASE", DEFAULT_LLM_API_BASE))?;
        let defaults = MappingPaths::default();

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: PathBuf::from(env_string("LOG_DIR", "logs")),
            llm: LlmSettings {
                base_url,
                api_key: env_string("LLM_API_KEY", DEFAULT_LLM_API_KEY),
                model: env_string("LLM_MODEL", DEFAULT_LLM_MODEL),
                timeout_seconds: normalize_timeout(env_u64(
                    "LLM_TIMEOUT",
                    DEFAULT_LLM_TIMEOUT_SECONDS,
                )),
                temperature: env_f32("LLM_TEMPERATURE", DEFAULT_LLM_TEMPERATURE),
            },
            mapping_paths: MappingPaths {
                mappings: PathBuf::from(env_string(
                    "MAPPINGS_FILE",
                    &defaults.mappings.to_string_lossy(),
                )),
                styles: env_optional_path(
                    "STYLES_FILE",
                    "static/mappings/mappings_styles.json",
                ),
                anime_mappings: PathBuf::from(env_string(
                    "ANIME_MAPPINGS_FILE",
                    &defaults.anime_mappings.to_string_lossy(),
                )),
            },
        })
    }
}
