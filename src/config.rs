//! Run settings
//!
//! Defaults come from the environment (optionally seeded from `.env`);
//! interactive setup may override a few of them before the run starts.

use crate::llm::ProviderType;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TURNS: usize = 5;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_RESPONSE_LENGTH: u32 = 300;
pub const DEFAULT_TURN_DELAY_MS: u64 = 1000;

/// Conversational guidelines used when `CUSTOM_INSTRUCTIONS` is unset
pub const DEFAULT_INSTRUCTIONS: &str = "\
# How to speak
- Keep the character's personality and manner of speech consistent.
- Show the character's own reactions and feelings.
- Keep the opening system prompt as the axis of the conversation.
- Take ideas from what the other characters said and develop the conversation.
# Avoid
- Long explanations or monologues
- Abrupt topic changes that ignore the flow of the conversation
- Repeated self-introductions
- Repeating yourself
- Parroting the other speaker";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read setup input: {0}")]
    Input(#[from] std::io::Error),
}

/// Everything fixed for the duration of one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider_type: ProviderType,
    /// Opening prompt seeded as a system message; may be empty
    pub prompt: String,
    pub turns: usize,
    pub temperature: f32,
    /// Reply length cap, in characters for the prompt and tokens for the API
    pub max_response_length: u32,
    pub custom_instructions: String,
    pub turn_delay_ms: u64,
    /// `Some(true)` to continue from prior memory; `None` means ask the operator
    pub use_memory: Option<bool>,
    /// Regenerate memory after a completed run
    pub summarize: bool,
    pub characters_dir: PathBuf,
    pub output_dir: PathBuf,
    pub memory_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            prompt: String::new(),
            turns: DEFAULT_TURNS,
            temperature: DEFAULT_TEMPERATURE,
            max_response_length: DEFAULT_MAX_RESPONSE_LENGTH,
            custom_instructions: DEFAULT_INSTRUCTIONS.to_string(),
            turn_delay_ms: DEFAULT_TURN_DELAY_MS,
            use_memory: None,
            summarize: true,
            characters_dir: PathBuf::from("characters"),
            output_dir: PathBuf::from("dist"),
            memory_path: PathBuf::from("dist/memory/conversation_memory.md"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank keys keep defaults
    /// and unparseable values log a warning and keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let turns = parse_or(var("MAX_TURNS"), "MAX_TURNS", defaults.turns);
        let turns = if turns == 0 {
            tracing::warn!("MAX_TURNS must be at least 1; using {DEFAULT_TURNS}");
            DEFAULT_TURNS
        } else {
            turns
        };

        Self {
            provider_type: parse_or(
                var("DEFAULT_PROVIDER"),
                "DEFAULT_PROVIDER",
                defaults.provider_type,
            ),
            prompt: var("DEFAULT_PROMPT").unwrap_or(defaults.prompt),
            turns,
            temperature: parse_or(var("TEMPERATURE"), "TEMPERATURE", defaults.temperature),
            max_response_length: parse_or(
                var("MAX_RESPONSE_LENGTH"),
                "MAX_RESPONSE_LENGTH",
                defaults.max_response_length,
            ),
            custom_instructions: var("CUSTOM_INSTRUCTIONS").unwrap_or(defaults.custom_instructions),
            turn_delay_ms: parse_or(var("TURN_DELAY_MS"), "TURN_DELAY_MS", defaults.turn_delay_ms),
            use_memory: var("USE_MEMORY").and_then(|v| parse_flag(&v, "USE_MEMORY")),
            summarize: var("ENABLE_SUMMARY")
                .and_then(|v| parse_flag(&v, "ENABLE_SUMMARY"))
                .unwrap_or(defaults.summarize),
            characters_dir: var("CHARACTERS_DIR").map_or(defaults.characters_dir, PathBuf::from),
            output_dir: var("OUTPUT_DIR").map_or(defaults.output_dir, PathBuf::from),
            memory_path: var("MEMORY_PATH").map_or(defaults.memory_path, PathBuf::from),
        }
    }

    pub fn turn_delay(&self) -> Duration {
        Duration::from_millis(self.turn_delay_ms)
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    let Some(raw) = value else {
        return default;
    };
    match raw.trim().parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, default = ?default, "Ignoring invalid setting");
            default
        }
    }
}

fn parse_flag(raw: &str, key: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value = %raw, "Ignoring invalid flag");
            None
        }
    }
}
