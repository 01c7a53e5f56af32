use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub llm_api_url: String,
    pub llm_api_key: Option<String>,
    pub default_model: String,
    pub llm_timeout: Duration,
    pub llm_temperature: Option<f32>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            llm_api_url: var("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.into()),
            llm_api_key: var("LLM_API_KEY"),
            default_model: var("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            llm_timeout: Duration::from_secs(
                var("LLM_TIMEOUT_SECS")
                    .map(|value| value.trim().parse())
                    .transpose()
                    .context("LLM_TIMEOUT_SECS must be a number of seconds")?
                    .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
            ),
            llm_temperature: var("LLM_TEMPERATURE")
                .map(|value| value.trim().parse())
                .transpose()
                .context("LLM_TEMPERATURE must be a number")?,
        })
    }
}
