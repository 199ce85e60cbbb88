//! Ordering of note listings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::note::Note;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "modifiedAt")]
    ModifiedAt,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortField {
    /// Match a query-string value. Unknown names sort nothing.
    pub fn from_query(raw: &str) -> Option<Self> {
        match raw.trim() {
            "title" => Some(Self::Title),
            "createdAt" => Some(Self::CreatedAt),
            "modifiedAt" => Some(Self::ModifiedAt),
            _ => None,
        }
    }
}

impl SortOrder {
    /// Empty means ascending; anything other than `asc` (any case) means descending.
    pub fn from_query(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Titles compare case-insensitively, timestamps chronologically.
    /// The sort is stable: equal keys keep their stored order in both directions.
    pub fn sort(&self, notes: &mut [Note]) {
        match self.field {
            SortField::Title => {
                notes.sort_by_cached_key(|n| n.title.to_lowercase());
            }
            SortField::CreatedAt => notes.sort_by_key(|n| n.created_at),
            SortField::ModifiedAt => notes.sort_by_key(|n| n.modified_at),
        }
        if self.order == SortOrder::Desc {
            reverse_stable(notes, |a, b| self.compare(a, b));
        }
    }

    fn compare(&self, a: &Note, b: &Note) -> Ordering {
        match self.field {
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::ModifiedAt => a.modified_at.cmp(&b.modified_at),
        }
    }
}

/// Reverse an ascending-sorted slice while keeping runs of equal keys in their original order.
fn reverse_stable<F>(notes: &mut [Note], cmp: F)
where
    F: Fn(&Note, &Note) -> Ordering,
{
    notes.reverse();
    let mut start = 0;
    while start < notes.len() {
        let mut end = start + 1;
        while end < notes.len() && cmp(&notes[start], &notes[end]) == Ordering::Equal {
            end += 1;
        }
        notes[start..end].reverse();
        start = end;
    }
}
