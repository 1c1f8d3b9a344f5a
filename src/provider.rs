//! Provider adapters
//!
//! A provider voices one character for one turn. Whatever goes wrong below
//! this boundary (transport errors, refusals, empty or trivial replies)
//! comes back as `None`; callers never see an error.

mod chat;
mod single_prompt;

pub use chat::ChatCompletionProvider;
pub use single_prompt::{extract_utterance, SinglePromptProvider};

use crate::character::Character;
use crate::config::Settings;
use crate::llm::{LlmService, ProviderType};
use crate::transcript::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// Replies shorter than this many characters are rejected
pub const MIN_REPLY_CHARS: usize = 2;

/// Read-only view of the run handed to a provider for one call
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub history: &'a [Message],
    pub settings: &'a Settings,
    /// Names of everyone in the conversation, in speaking order
    pub participants: &'a [&'a str],
    /// Keep the reply as returned; no `speaker:` label stripping
    pub verbatim: bool,
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Produce `character`'s next line, or `None` if no usable reply came back
    async fn send_message(&self, character: &Character, ctx: &TurnContext<'_>) -> Option<Message>;
}

/// Pick the adapter matching the backend's prompt style
pub fn for_backend(provider: ProviderType, llm: Arc<dyn LlmService>) -> Box<dyn Provider> {
    match provider {
        ProviderType::ChatGpt => Box::new(ChatCompletionProvider::new(llm)),
        ProviderType::Gemini => Box::new(SinglePromptProvider::new(llm)),
    }
}

/// Turn raw reply text into a transcript message, rejecting trivial replies
pub fn validate_reply(character: &Character, text: String) -> Option<Message> {
    if text.chars().count() < MIN_REPLY_CHARS {
        tracing::warn!(
            speaker = %character.name,
            chars = text.chars().count(),
            "Empty or too-short reply"
        );
        return None;
    }
    Some(Message::reply(character.name.clone(), text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Role;
    use proptest::prelude::*;

    #[test]
    fn test_short_replies_rejected() {
        let alice = Character::new("Alice", "");
        assert_eq!(validate_reply(&alice, String::new()), None);
        assert_eq!(validate_reply(&alice, "x".to_string()), None);
        // Counted in characters, not bytes
        assert_eq!(validate_reply(&alice, "あ".to_string()), None);
    }

    #[test]
    fn test_two_chars_pass() {
        let alice = Character::new("Alice", "");
        let msg = validate_reply(&alice, "ok".to_string()).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.speaker.as_deref(), Some("Alice"));
        assert_eq!(msg.content, "ok");
    }

    proptest! {
        #[test]
        fn prop_validation_threshold(text in "\\PC{0,6}") {
            let alice = Character::new("Alice", "");
            let result = validate_reply(&alice, text.clone());
            if text.chars().count() >= MIN_REPLY_CHARS {
                prop_assert_eq!(result.map(|m| m.content), Some(text));
            } else {
                prop_assert!(result.is_none());
            }
        }
    }
}
