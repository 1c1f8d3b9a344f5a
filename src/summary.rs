//! Conversation summarization for cross-run memory
//!
//! A synthetic "Summarizer" character is sent through the same provider as
//! the cast, so summaries work on either backend without extra plumbing.

use crate::character::{Character, CharacterRegistry};
use crate::config::Settings;
use crate::provider::{Provider, TurnContext};
use crate::transcript::Message;
use std::fmt::Write;

pub const SUMMARIZER_NAME: &str = "Summarizer";

const SUMMARIZER_BRIEF: &str = "\
- You are an AI that summarizes past conversations.
- You supply information that enriches the AI characters and helps keep their conversation lively.
- Analyze the conversation history and extract what matters.
- Write in Markdown, as bullet points.
- Useful content includes concrete background details about the characters and the relationships between participants.
- Reply with the summary only. No extra explanation.
- Your summary replaces the previous one, so carry over what the previous summary contained.";

/// Build the summarizer persona from the cast and any prior memory.
pub fn summarizer_character(registry: &CharacterRegistry, prior_memory: &str) -> Character {
    let mut persona = String::from(SUMMARIZER_BRIEF);

    let cast = registry
        .list()
        .map(|c| format!("- {}: {}", c.name, c.persona.trim()))
        .collect::<Vec<_>>()
        .join("\n\n");
    let _ = write!(
        persona,
        "\n- The following is already known, so summarize everything else:\n{cast}"
    );

    let prior = prior_memory.trim();
    if !prior.is_empty() {
        let _ = write!(persona, "\n- Summary of earlier conversations: {prior}\n");
    }

    Character::new(SUMMARIZER_NAME, persona)
}

/// Ask the provider to condense `history` (plus prior memory) into a new
/// memory text. `None` when the provider produced nothing usable.
pub async fn generate_summary(
    provider: &dyn Provider,
    registry: &CharacterRegistry,
    history: &[Message],
    settings: &Settings,
    prior_memory: &str,
) -> Option<String> {
    let summarizer = summarizer_character(registry, prior_memory);
    let participants = registry.names();
    let ctx = TurnContext {
        history,
        settings,
        participants: &participants,
        verbatim: true,
    };

    tracing::info!(messages = history.len(), "Generating conversation summary");
    match provider.send_message(&summarizer, &ctx).await {
        Some(message) => Some(message.content),
        None => {
            tracing::warn!("Summarizer produced no usable reply");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    fn registry() -> CharacterRegistry {
        CharacterRegistry::from_entries([
            ("a".to_string(), Character::new("A", "Likes tea.")),
            ("b".to_string(), Character::new("B", "Likes coffee.")),
        ])
        .unwrap()
    }

    #[test]
    fn test_persona_lists_cast() {
        let summarizer = summarizer_character(&registry(), "");
        assert_eq!(summarizer.name, SUMMARIZER_NAME);
        assert!(summarizer.persona.contains("- A: Likes tea."));
        assert!(summarizer.persona.contains("- B: Likes coffee."));
        assert!(!summarizer.persona.contains("earlier conversations"));
    }

    #[test]
    fn test_persona_carries_prior_memory() {
        let summarizer = summarizer_character(&registry(), "- A and B met at the pier\n");
        assert!(summarizer
            .persona
            .contains("Summary of earlier conversations: - A and B met at the pier"));
    }

    #[tokio::test]
    async fn test_summary_sees_transcript() {
        let provider = ScriptedProvider::new(|_, _| Some("- They argued about drinks".to_string()));
        let history = vec![Message::reply("A", "Tea!"), Message::reply("B", "Coffee!")];

        let summary = generate_summary(
            &provider,
            &registry(),
            &history,
            &Settings::default(),
            "",
        )
        .await;
        assert_eq!(summary.as_deref(), Some("- They argued about drinks"));

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].speaker, SUMMARIZER_NAME);
        assert_eq!(calls[0].history, history);
        assert_eq!(calls[0].participants, ["A", "B"]);
    }

    #[tokio::test]
    async fn test_markdown_summary_survives_single_prompt_backend() {
        use crate::llm::LlmResponse;
        use crate::provider::SinglePromptProvider;
        use crate::testing::MockLlmService;
        use std::sync::Arc;

        let llm = Arc::new(MockLlmService::new("gemini-test"));
        llm.queue_response(LlmResponse::from_text("- A: likes tea\n- B: likes coffee"));
        let provider = SinglePromptProvider::new(llm);

        let summary =
            generate_summary(&provider, &registry(), &[], &Settings::default(), "").await;
        assert_eq!(summary.as_deref(), Some("- A: likes tea\n- B: likes coffee"));
    }

    #[tokio::test]
    async fn test_no_reply_is_none() {
        let provider = ScriptedProvider::new(|_, _| None);
        let summary =
            generate_summary(&provider, &registry(), &[], &Settings::default(), "old").await;
        assert_eq!(summary, None);
    }
}
