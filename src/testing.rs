//! Mock implementations for testing
//!
//! These mocks let the providers and the orchestrator run without a network.

use crate::character::Character;
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::provider::{Provider, TurnContext};
use crate::transcript::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock LLM service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Scripted Provider
// ============================================================================

/// What a [`ScriptedProvider`] saw on one call
#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub speaker: String,
    pub persona: String,
    pub history: Vec<Message>,
    pub participants: Vec<String>,
}

type ReplyFn = dyn Fn(usize, &Character) -> Option<String> + Send + Sync;

/// Provider whose replies come from a closure of `(call index, character)`
pub struct ScriptedProvider {
    reply: Box<ReplyFn>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl ScriptedProvider {
    pub fn new(reply: impl Fn(usize, &Character) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every character answers `"<name> said hi"`
    pub fn greeting() -> Self {
        Self::new(|_, c| Some(format!("{} said hi", c.name)))
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn speakers(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.speaker).collect()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn send_message(&self, character: &Character, ctx: &TurnContext<'_>) -> Option<Message> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(ProviderCall {
                speaker: character.name.clone(),
                persona: character.persona.clone(),
                history: ctx.history.to_vec(),
                participants: ctx.participants.iter().map(ToString::to_string).collect(),
            });
            calls.len() - 1
        };
        (self.reply)(index, character).map(|text| Message::reply(character.name.clone(), text))
    }
}
