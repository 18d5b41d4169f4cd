//! Shared editable document types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::column::TemplateKind;

/// Identity of a shared document.
///
/// Editors bound to equal keys share one buffer and one save status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKey {
    /// `template:<kind>`
    Template(TemplateKind),
    /// `statement:<id>`
    Statement(String),
    /// A scratch buffer that is never written to the backend.
    Local(uuid::Uuid),
}

impl DocumentKey {
    /// A fresh local key.
    #[must_use]
    pub fn local() -> Self {
        Self::Local(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template(kind) => write!(f, "template:{kind}"),
            Self::Statement(id) => write!(f, "statement:{id}"),
            Self::Local(id) => write!(f, "local:{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

/// Observable snapshot of one shared document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub text: String,
    pub status: SaveStatus,
    /// `text` differs from the last successfully persisted content.
    pub is_dirty: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl DocumentState {
    /// Status line shown next to an editor.
    #[must_use]
    pub fn status_message(&self, now: DateTime<Utc>) -> String {
        match self.status {
            SaveStatus::Saving => "Saving...".to_string(),
            SaveStatus::Saved => match self.last_saved_at {
                Some(at) => format!("Saved {}", format_relative(at, now)),
                None => "Saved".to_string(),
            },
            SaveStatus::Error => "Failed to save".to_string(),
            SaveStatus::Idle if self.is_dirty => "Unsaved changes".to_string(),
            SaveStatus::Idle => String::new(),
        }
    }
}

fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds().max(0);
    if seconds < 60 {
        return format!("{seconds}s ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    at.format("%Y-%m-%d").to_string()
}

/// Result of asking a document to save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The content was persisted.
    Saved,
    /// The write failed; the buffer is kept.
    Failed,
    /// Nothing to write (unchanged from the persisted content, or no backend).
    Skipped,
    /// A save is in flight; one follow-up save will run after it settles.
    Queued,
}
