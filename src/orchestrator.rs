//! Turn orchestration
//!
//! Drives one dialogue run through `Seeding -> Looping -> Summarizing -> Done`.
//! Nothing in here returns an error: an invalid reply or a missing speaker
//! ends the loop early, and whatever transcript exists is still flushed.

use crate::character::CharacterRegistry;
use crate::config::Settings;
use crate::memory::MemoryStore;
use crate::provider::{Provider, TurnContext};
use crate::summary::generate_summary;
use crate::transcript::{Message, Transcript};
use chrono::Utc;
use std::io::Write;
use std::path::PathBuf;

/// Phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Seeding,
    Looping,
    Summarizing,
    Done,
}

/// Why the turn loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// All configured turns were taken
    Completed,
    /// No character exists for this 1-based turn
    MissingCharacter { turn: usize },
    /// The provider returned nothing usable on this 1-based turn
    InvalidReply { turn: usize, speaker: String },
}

impl StopReason {
    pub fn is_completed(&self) -> bool {
        matches!(self, StopReason::Completed)
    }
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub transcript: Vec<Message>,
    pub stop: StopReason,
    /// Where the transcript was written, if the flush succeeded
    pub saved_to: Option<PathBuf>,
    pub memory_saved: bool,
}

/// Build the leading system message text from the prompt and, when the
/// operator opted in, the previous run's memory.
pub fn seed_content(prompt: &str, memory: Option<&str>) -> Option<String> {
    let memory_context = memory
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            format!(
                "Summary of the previous conversation: {m}\n\nContinue the conversation naturally with that context in mind:"
            )
        });

    let content = [memory_context.as_deref(), Some(prompt.trim())]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    (!content.is_empty()).then_some(content)
}

/// Format one message the way it appears on the progress stream.
pub fn format_progress(message: &Message, speaker_key: &str, turn: usize) -> String {
    match &message.speaker {
        Some(speaker) => format!(
            "\n<div class=\"{speaker_key}\" count=\"{turn}\">\n{speaker}: {}\n</div>",
            message.content
        ),
        None => format!("{}: {}", message.role, message.content),
    }
}

/// Runs a dialogue over a fixed cast with one provider
pub struct Orchestrator<'a, W: Write> {
    registry: &'a CharacterRegistry,
    provider: &'a dyn Provider,
    settings: &'a Settings,
    memory: &'a MemoryStore,
    progress: W,
    transcript: Transcript,
    phase: RunPhase,
}

impl<'a, W: Write> Orchestrator<'a, W> {
    pub fn new(
        registry: &'a CharacterRegistry,
        provider: &'a dyn Provider,
        settings: &'a Settings,
        memory: &'a MemoryStore,
        progress: W,
    ) -> Self {
        Self {
            registry,
            provider,
            settings,
            memory,
            progress,
            transcript: Transcript::new(),
            phase: RunPhase::Seeding,
        }
    }

    pub async fn run(mut self) -> RunReport {
        let prior_memory = match self.memory.load_entry() {
            Some(entry) => {
                tracing::debug!(generated_at = ?entry.generated_at, "Prior memory found");
                entry.summary
            }
            None => String::new(),
        };

        self.seed(&prior_memory);

        self.enter(RunPhase::Looping);
        let stop = self.take_turns().await;
        // Persist before the summary call so a killed run keeps its turns
        let saved_to = self.flush();

        let mut memory_saved = false;
        if stop.is_completed() && self.settings.summarize {
            self.enter(RunPhase::Summarizing);
            memory_saved = self.summarize(&prior_memory).await;
        }

        self.enter(RunPhase::Done);

        match &stop {
            StopReason::Completed => {
                tracing::info!(messages = self.transcript.len(), "Conversation completed");
            }
            StopReason::MissingCharacter { turn } => {
                tracing::error!(turn, "No character for turn; conversation stopped early");
            }
            StopReason::InvalidReply { turn, speaker } => {
                tracing::warn!(turn, %speaker, "Invalid reply; conversation stopped early");
            }
        }

        RunReport {
            transcript: self.transcript.all(),
            stop,
            saved_to,
            memory_saved,
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "Run phase change");
        self.phase = phase;
    }

    fn seed(&mut self, prior_memory: &str) {
        let memory = (self.settings.use_memory == Some(true)).then_some(prior_memory);
        if let Some(content) = seed_content(&self.settings.prompt, memory) {
            let message = Message::system(content);
            self.print(&message, "", 0);
            self.transcript.append(message);
        }
    }

    async fn take_turns(&mut self) -> StopReason {
        let participants = self.registry.names();
        let turns = self.settings.turns;

        for i in 0..turns {
            let turn = i + 1;
            let Some(id) = self.registry.speaker_for_turn(i) else {
                return StopReason::MissingCharacter { turn };
            };
            let (Some(character), Some(key)) = (self.registry.get(id), self.registry.key(id))
            else {
                return StopReason::MissingCharacter { turn };
            };

            let reply = {
                let ctx = TurnContext {
                    history: self.transcript.as_slice(),
                    settings: self.settings,
                    participants: &participants,
                    verbatim: false,
                };
                self.provider.send_message(character, &ctx).await
            };

            let Some(message) = reply else {
                return StopReason::InvalidReply {
                    turn,
                    speaker: character.name.clone(),
                };
            };

            tracing::debug!(turn, speaker = %character.name, "Turn complete");
            self.print(&message, key, turn);
            self.transcript.append(message);

            if turn < turns && self.settings.turn_delay_ms > 0 {
                tokio::time::sleep(self.settings.turn_delay()).await;
            }
        }

        StopReason::Completed
    }

    async fn summarize(&self, prior_memory: &str) -> bool {
        let summary = generate_summary(
            self.provider,
            self.registry,
            self.transcript.as_slice(),
            self.settings,
            prior_memory,
        )
        .await;

        match summary {
            Some(text) => self.memory.save(&text),
            None => {
                tracing::warn!("Keeping previous memory");
                false
            }
        }
    }

    fn flush(&self) -> Option<PathBuf> {
        if self.transcript.is_empty() {
            tracing::warn!("Saving a conversation with no messages");
        }
        match self.transcript.save_to_dir(&self.settings.output_dir, Utc::now()) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Conversation saved");
                Some(path)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save conversation");
                None
            }
        }
    }

    fn print(&mut self, message: &Message, speaker_key: &str, turn: usize) {
        let line = format_progress(message, speaker_key, turn);
        if let Err(e) = writeln!(self.progress, "{line}") {
            tracing::warn!(error = %e, "Failed to write progress output");
        }
    }
}
