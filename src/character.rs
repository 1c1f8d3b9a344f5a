//! Character registry
//!
//! Characters are listed in `<dir>/roster.json` and each persona lives in
//! `<dir>/<id>.md`. The roster order is the speaking order.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ROSTER_FILE: &str = "roster.json";

/// Index of a character in the registry it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacterId(usize);

/// A named persona
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub name: String,
    /// Voice, manner and background injected into every prompt
    pub persona: String,
}

impl Character {
    pub fn new(name: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persona: persona.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CharacterError {
    #[error("failed to read roster {path}: {source}")]
    RosterIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed roster {path}: {source}")]
    RosterFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("character id '{0}' appears more than once in the roster")]
    DuplicateKey(String),
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    id: String,
    name: String,
}

#[derive(Debug, Clone)]
struct Slot {
    key: String,
    character: Character,
}

/// Fixed, ordered table of characters
#[derive(Debug, Clone, Default)]
pub struct CharacterRegistry {
    slots: Vec<Slot>,
}

impl CharacterRegistry {
    /// Load the roster and persona files from `dir`.
    ///
    /// A missing persona file leaves that character with an empty persona.
    pub fn load(dir: &Path) -> Result<Self, CharacterError> {
        let roster_path = dir.join(ROSTER_FILE);
        let data = std::fs::read_to_string(&roster_path).map_err(|source| {
            CharacterError::RosterIo {
                path: roster_path.clone(),
                source,
            }
        })?;
        let roster: Vec<RosterEntry> =
            serde_json::from_str(&data).map_err(|source| CharacterError::RosterFormat {
                path: roster_path.clone(),
                source,
            })?;

        let entries = roster.into_iter().map(|entry| {
            let persona = load_persona(dir, &entry.id);
            (entry.id, Character::new(entry.name, persona))
        });
        let registry = Self::from_entries(entries)?;

        tracing::info!(
            dir = %dir.display(),
            characters = ?registry.names(),
            "Character roster loaded"
        );
        Ok(registry)
    }

    /// Build a registry from `(key, character)` pairs in speaking order
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, Character)>,
    ) -> Result<Self, CharacterError> {
        let mut slots: Vec<Slot> = Vec::new();
        for (key, character) in entries {
            if slots.iter().any(|s| s.key == key) {
                return Err(CharacterError::DuplicateKey(key));
            }
            slots.push(Slot { key, character });
        }
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Characters in roster order
    pub fn list(&self) -> impl Iterator<Item = &Character> {
        self.slots.iter().map(|s| &s.character)
    }

    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.slots.get(id.0).map(|s| &s.character)
    }

    /// Roster key, used as the progress output's class attribute
    pub fn key(&self, id: CharacterId) -> Option<&str> {
        self.slots.get(id.0).map(|s| s.key.as_str())
    }

    /// Round-robin speaker for a zero-based turn index
    pub fn speaker_for_turn(&self, turn: usize) -> Option<CharacterId> {
        if self.slots.is_empty() {
            return None;
        }
        Some(CharacterId(turn % self.slots.len()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.character.name.as_str()).collect()
    }
}

fn load_persona(dir: &Path, id: &str) -> String {
    let path = dir.join(format!("{id}.md"));
    match std::fs::read_to_string(&path) {
        Ok(persona) => persona,
        Err(e) => {
            tracing::warn!(
                character = %id,
                path = %path.display(),
                error = %e,
                "Persona file unreadable; continuing with an empty persona"
            );
            String::new()
        }
    }
}
