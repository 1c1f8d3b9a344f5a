//! Chat-completions style adapter
//!
//! Sends the character sheet as the system prompt and the transcript as
//! role-tagged chat messages.

use super::{validate_reply, Provider, TurnContext};
use crate::character::Character;
use crate::llm::{LlmMessage, LlmRequest, LlmService, MessageRole, SystemContent};
use crate::system_prompt::build_character_prompt;
use crate::transcript::{Message, Role};
use async_trait::async_trait;
use std::sync::Arc;

pub struct ChatCompletionProvider {
    llm: Arc<dyn LlmService>,
}

impl ChatCompletionProvider {
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

        let messages = ctx
            .history
            .iter()
            .map(|msg| LlmMessage {
                role: match msg.role {
                    Role::System => MessageRole::System,
                    Role::User => MessageRole::User,
                    Role::Assistant => MessageRole::Assistant,
                },
                content: msg.content.clone(),
            })
            .collect();

        LlmRequest {
            system: vec![SystemContent::new(system)],
            messages,
            max_tokens: Some(ctx.settings.max_response_length),
            temperature: Some(ctx.settings.temperature),
        }
    }
}

#[async_trait]
impl Provider for ChatCompletionProvider {
    async fn send_message(&self, character: &Character, ctx: &TurnContext<'_>) -> Option<Message> {
        let request = Self::build_request(character, ctx);

        match self.llm.complete(&request).await {
            Ok(response) => validate_reply(character, response.text),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::llm::{LlmError, LlmResponse};
    use crate::testing::MockLlmService;

    fn settings() -> Settings {
        Settings {
            max_response_length: 120,
            temperature: 0.5,
            custom_instructions: "Stay in character.".to_string(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_sends_history_as_chat_messages() {
        let llm = Arc::new(MockLlmService::new("gpt-test"));
        llm.queue_response(LlmResponse::from_text("Fair winds, Mira."));
        let provider = ChatCompletionProvider::new(llm.clone());

        let settings = settings();
        let history = vec![
            Message::system("Talk about the tide"),
            Message::reply("Mira", "The tide is early today."),
        ];
        let ctx = TurnContext {
            history: &history,
            settings: &settings,
            participants: &["Mira", "Tobias"],
            verbatim: false,
        };
        let tobias = Character::new("Tobias", "A cartographer.");

        let reply = provider.send_message(&tobias, &ctx).await.unwrap();
        assert_eq!(reply, Message::reply("Tobias", "Fair winds, Mira."));

        let requests = llm.recorded_requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.max_tokens, Some(120));
        assert!(request.temperature.is_some_and(|t| (t - 0.5).abs() < f32::EPSILON));
        assert!(request.system[0].text.contains("\"Tobias\""));
        assert!(request.system[0].text.contains("Stay in character."));
        let roles: Vec<_> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, [MessageRole::System, MessageRole::Assistant]);
        assert_eq!(request.messages[1].content, "The tide is early today.");
    }

    #[tokio::test]
    async fn test_reply_passed_through_untrimmed() {
        let llm = Arc::new(MockLlmService::new("gpt-test"));
        llm.queue_response(LlmResponse::from_text("  Hm.  "));
        let provider = ChatCompletionProvider::new(llm);
        let settings = settings();
        let ctx = TurnContext {
            history: &[],
            settings: &settings,
            participants: &["A"],
            verbatim: false,
        };

        let reply = provider
            .send_message(&Character::new("A", ""), &ctx)
            .await
            .unwrap();
        assert_eq!(reply.content, "  Hm.  ");
    }

    #[tokio::test]
    async fn test_failures_become_none() {
        let llm = Arc::new(MockLlmService::new("gpt-test"));
        llm.queue_error(LlmError::auth("bad key"));
        llm.queue_response(LlmResponse::from_text("k"));
        let provider = ChatCompletionProvider::new(llm);
        let settings = settings();
        let ctx = TurnContext {
            history: &[],
            settings: &settings,
            participants: &["A"],
            verbatim: false,
        };
        let a = Character::new("A", "");

        assert!(provider.send_message(&a, &ctx).await.is_none());
        assert!(provider.send_message(&a, &ctx).await.is_none());
    }
}
