use std::{path::PathBuf, str::FromStr};

use anyhow::{Context, anyhow};
use doctormate_directory::{DEFAULT_BASE_URL, DEFAULT_DOCTOR_LIMIT};

pub const DEFAULT_MODEL_PATH: &str = "models/MobileNetV2_best.onnx";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_PORT: u16 = 8000;

/// Configuration for the service, read once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub model_path: PathBuf,
    /// `None` uses the knowledge base compiled into the binary.
    pub skin_rules_path: Option<PathBuf>,
    pub directory_url: String,
    pub doctor_limit: usize,
    pub max_upload_bytes: usize,
    pub port: u16,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests need not touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("GEMINI_API_KEY environment variable is not set"))?;

        Ok(Self {
            gemini_api_key,
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            skin_rules_path: lookup("SKIN_RULES_PATH").map(PathBuf::from),
            directory_url: lookup("DOCTORMATE_API_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            doctor_limit: parse_or(&lookup, "RECOMMENDED_DOCTORS_LIMIT", DEFAULT_DOCTOR_LIMIT)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        None => Ok(default),
    }
}
