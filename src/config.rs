use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "dme-intake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_LLM_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3.1";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const ENV_EXTRACTOR: &str = "DME_EXTRACTOR";
pub const ENV_LLM_URL: &str = "DME_LLM_URL";
pub const ENV_LLM_MODEL: &str = "DME_LLM_MODEL";
pub const ENV_LLM_TIMEOUT_SECS: &str = "DME_LLM_TIMEOUT_SECS";
pub const ENV_ORDER_ENDPOINT: &str = "DME_ORDER_ENDPOINT";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "DME_HTTP_TIMEOUT_SECS";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "dme_intake_lib=info,dme_intake=info,warn"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown extractor '{0}' (expected 'heuristic' or 'llm')")]
    UnknownExtractor(String),

    #[error("{key} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { key: &'static str, value: String },
}

/// Which extractor drives the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractorMode {
    #[default]
    Heuristic,
    Llm,
}

impl ExtractorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Llm => "llm",
        }
    }
}

impl fmt::Display for ExtractorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "regex" => Ok(Self::Heuristic),
            "llm" | "ollama" => Ok(Self::Llm),
            other => Err(ConfigError::UnknownExtractor(other.to_string())),
        }
    }
}

/// Runtime settings. Every value has a default except the order endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub extractor: ExtractorMode,
    pub llm_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    /// `None` means orders cannot be submitted (dry run only).
    pub order_endpoint: Option<String>,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorMode::default(),
            llm_url: DEFAULT_LLM_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            order_endpoint: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            extractor: get(ENV_EXTRACTOR)
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(defaults.extractor),
            llm_url: get(ENV_LLM_URL).unwrap_or(defaults.llm_url),
            llm_model: get(ENV_LLM_MODEL).unwrap_or(defaults.llm_model),
            llm_timeout_secs: get(ENV_LLM_TIMEOUT_SECS)
                .map(|v| parse_timeout(ENV_LLM_TIMEOUT_SECS, v))
                .transpose()?
                .unwrap_or(defaults.llm_timeout_secs),
            order_endpoint: get(ENV_ORDER_ENDPOINT),
            http_timeout_secs: get(ENV_HTTP_TIMEOUT_SECS)
                .map(|v| parse_timeout(ENV_HTTP_TIMEOUT_SECS, v))
                .transpose()?
                .unwrap_or(defaults.http_timeout_secs),
        })
    }
}

fn parse_timeout(key: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidTimeout { key, value }),
    }
}
