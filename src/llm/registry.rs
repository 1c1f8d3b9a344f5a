//! Backend selection and credentials

use super::{GeminiService, LlmError, LlmService, LoggingService, OpenAIService};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Which backend voices the characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderType {
    #[default]
    Gemini,
    ChatGpt,
}

impl ProviderType {
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderType::Gemini => "Gemini",
            ProviderType::ChatGpt => "ChatGPT",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderType::Gemini => "gemini",
            ProviderType::ChatGpt => "chatgpt",
        })
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderType::Gemini),
            "chatgpt" | "openai" => Ok(ProviderType::ChatGpt),
            other => Err(format!("unknown provider '{other}' (expected gemini or chatgpt)")),
        }
    }
}

/// Credentials and endpoints for both backends
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    /// Root of an OpenAI-compatible API, e.g. `http://localhost:11434/v1`
    pub openai_base_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: var("OPENAI_API_KEY"),
            openai_model: var("OPENAI_MODEL"),
            openai_base_url: var("OPENAI_BASE_URL"),
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL"),
            gemini_base_url: var("GEMINI_BASE_URL"),
        }
    }

    pub fn model_for(&self, provider: ProviderType) -> &str {
        match provider {
            ProviderType::ChatGpt => self.openai_model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL),
            ProviderType::Gemini => self.gemini_model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL),
        }
    }
}

/// Build the logging-wrapped service for the chosen backend.
///
/// Fails with an auth error when the backend's API key is not configured.
pub fn create_service(
    provider: ProviderType,
    config: &LlmConfig,
) -> Result<Arc<dyn LlmService>, LlmError> {
    let model = config.model_for(provider).to_string();

    let service: Arc<dyn LlmService> = match provider {
        ProviderType::ChatGpt => {
            let key = config
                .openai_api_key
                .clone()
                .ok_or_else(|| LlmError::auth("OPENAI_API_KEY is not set"))?;
            Arc::new(OpenAIService::new(key, model, config.openai_base_url.as_deref())?)
        }
        ProviderType::Gemini => {
            let key = config
                .gemini_api_key
                .clone()
                .ok_or_else(|| LlmError::auth("GEMINI_API_KEY is not set"))?;
            Arc::new(GeminiService::new(key, model, config.gemini_base_url.as_deref())?)
        }
    };

    Ok(Arc::new(LoggingService::new(service)))
}
