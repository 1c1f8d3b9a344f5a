//! Conversation transcript
//!
//! An append-only message history owned by a single run, plus the JSON file
//! format it is flushed to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        })
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Character name for replies; absent for seeded prompts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            speaker: None,
            content: content.into(),
        }
    }

    pub fn reply(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            speaker: Some(speaker.into()),
            content: content.into(),
        }
    }

    /// The label shown before the content: speaker name, else the role
    pub fn label(&self) -> String {
        self.speaker
            .clone()
            .unwrap_or_else(|| self.role.to_string())
    }
}

/// Errors writing or reading a transcript file
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("transcript JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ordered message history
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Owned snapshot; later appends are not visible through it
    pub fn all(&self) -> Vec<Message> {
        self.messages.clone()
    }

    #[allow(dead_code)] // Part of the store contract; a run never rewinds
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    /// Write the transcript as a pretty JSON array to
    /// `dir/conversation_<timestamp>.json`, creating `dir` if needed.
    pub fn save_to_dir(&self, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf, PersistError> {
        std::fs::create_dir_all(dir).map_err(|source| PersistError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(transcript_file_name(now));
        let json = serde_json::to_string_pretty(&self.messages)?;
        std::fs::write(&path, json).map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Read back a file written by [`Transcript::save_to_dir`]
    #[cfg(test)]
    pub fn load_from_file(path: &Path) -> Result<Self, PersistError> {
        let data = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let messages: Vec<Message> = serde_json::from_str(&data)?;
        Ok(Self { messages })
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// `conversation_2024-01-02T03-04-05.json`: ISO-8601 UTC, colons swapped for
/// dashes, sub-seconds dropped.
pub fn transcript_file_name(now: DateTime<Utc>) -> String {
    format!("conversation_{}.json", now.format("%Y-%m-%dT%H-%M-%S"))
}
