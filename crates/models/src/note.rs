use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// A persisted note. Serialized with camelCase keys and RFC 3339 timestamps,
/// which is also the on-disk format of the notes document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Note {
    /// Mint a note from validated input: fresh UUID v4 id, `createdAt == modifiedAt == now`.
    pub fn create(input: NewNote) -> Self {
        Self::create_at(input, Utc::now())
    }

    pub fn create_at(input: NewNote, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            content: input.content,
            created_at: now,
            modified_at: now,
        }
    }

    /// Apply the fields present in `patch` and bump `modified_at`,
    /// even when nothing actually changed.
    pub fn apply(&mut self, patch: NotePatch) {
        self.apply_at(patch, Utc::now());
    }

    pub fn apply_at(&mut self, patch: NotePatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        // modifiedAt >= createdAt must hold even if the wall clock stepped back
        self.modified_at = now.max(self.created_at);
    }
}

/// Validated input for creating a note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNote {
    title: String,
    content: String,
}

impl NewNote {
    /// Both fields are required and must be non-empty.
    pub fn new(title: Option<String>, content: Option<String>) -> Result<Self, ModelError> {
        let title = require_non_empty("title", title)?;
        let content = require_non_empty("content", content)?;
        Ok(Self { title, content })
    }

    pub fn title(&self) -> &str { &self.title }
    pub fn content(&self) -> &str { &self.content }
}

fn require_non_empty(field: &str, value: Option<String>) -> Result<String, ModelError> {
    match value {
        None => Err(ModelError::Validation(format!("{field} is required"))),
        Some(v) if v.is_empty() => Err(ModelError::Validation(format!("{field} should not be empty"))),
        Some(v) => Ok(v),
    }
}

/// Partial update. Absent fields are left untouched; empty strings are accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}
