//! Single-prompt adapter
//!
//! Flattens the character sheet and the whole transcript into one user
//! prompt. Models answering this way tend to echo the `Name: ` prefix, so
//! the utterance is pulled out of the reply when it has that shape.

use super::{validate_reply, Provider, TurnContext};
use crate::character::Character;
use crate::llm::{LlmMessage, LlmRequest, LlmService};
use crate::system_prompt::{build_character_prompt, build_transcript_prompt};
use crate::transcript::Message;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};

static SPEAKER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^[^:]+:\s*(.*)").expect("speaker prefix pattern"));

/// Strip a leading `speaker:` label; text without one is returned trimmed.
pub fn extract_utterance(text: &str) -> &str {
    SPEAKER_PREFIX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
        .trim()
}

pub struct SinglePromptProvider {
    llm: Arc<dyn LlmService>,
}

impl SinglePromptProvider {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    fn build_request(character: &Character, ctx: &TurnContext<'_>) -> LlmRequest {
        let system = build_character_prompt(
            character,
            ctx.participants,
            ctx.settings.max_response_length,
            &ctx.settings.custom_instructions,
        );

        LlmRequest {
            messages: vec![LlmMessage::user(build_transcript_prompt(
                &system,
                ctx.history,
            ))],
            temperature: Some(ctx.settings.temperature),
            ..LlmRequest::default()
        }
    }
}

#[async_trait]
impl Provider for SinglePromptProvider {
    async fn send_message(&self, character: &Character, ctx: &TurnContext<'_>) -> Option<Message> {
        let request = Self::build_request(character, ctx);

        match self.llm.complete(&request).await {
            Ok(response) => {
                let text = response.text.trim();
                let reply = if ctx.verbatim {
                    text
                } else {
                    extract_utterance(text)
                };
                validate_reply(character, reply.to_string())
            }
            Err(e) => {
                tracing::error!(
                    speaker = %character.name,
                    model = %self.llm.model_id(),
                    error = %e,
                    "Reply generation failed"
                );
                None
            }
        }
    }
}
