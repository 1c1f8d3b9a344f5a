//! Cross-run conversation memory
//!
//! One summary file, overwritten at the end of each run. The first line is
//! the generation timestamp; the rest is free text. Every failure here is
//! logged and swallowed so a broken memory file never stops a dialogue.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// A parsed memory file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    /// `None` for files without a recognizable timestamp line
    pub generated_at: Option<DateTime<Utc>>,
    pub summary: String,
}

/// File-backed memory at a fixed path
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// The stored summary, or an empty string when absent or unreadable
    pub fn load(&self) -> String {
        self.load_entry().map_or_else(String::new, |e| e.summary)
    }

    pub fn load_entry(&self) -> Option<MemoryEntry> {
        if !self.exists() {
            return None;
        }
        match std::fs::read_to_string(&self.path) {
            Ok(data) => Some(parse_entry(&data)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read memory file");
                None
            }
        }
    }

    /// Overwrite the stored summary, stamped with the current time.
    ///
    /// Returns whether the write succeeded.
    pub fn save(&self, summary: &str) -> bool {
        self.save_at(summary, Utc::now())
    }

    fn save_at(&self, summary: &str, now: DateTime<Utc>) -> bool {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::error!(path = %parent.display(), error = %e, "Failed to create memory directory");
                return false;
            }
        }

        let data = format!("{}\n{summary}\n", now.to_rfc3339());
        match std::fs::write(&self.path, data) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Conversation memory saved");
                true
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to write memory file");
                false
            }
        }
    }
}

fn parse_entry(data: &str) -> MemoryEntry {
    let (first, rest) = data.split_once('\n').unwrap_or((data, ""));
    match DateTime::parse_from_rfc3339(first.trim()) {
        Ok(ts) => MemoryEntry {
            generated_at: Some(ts.with_timezone(&Utc)),
            summary: rest.trim().to_string(),
        },
        // Hand-written memory files have no header; keep them whole
        Err(_) => MemoryEntry {
            generated_at: None,
            summary: data.trim().to_string(),
        },
    }
}
