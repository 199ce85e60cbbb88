use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::note::Note;

/// List view: everything except `content`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Detail view: the full note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<Note> for NoteSummary {
    fn from(n: Note) -> Self {
        Self { id: n.id, title: n.title, created_at: n.created_at, modified_at: n.modified_at }
    }
}

impl From<Note> for NoteDetail {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            title: n.title,
            content: n.content,
            created_at: n.created_at,
            modified_at: n.modified_at,
        }
    }
}
