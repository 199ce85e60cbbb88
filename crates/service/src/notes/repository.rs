use async_trait::async_trait;
use models::{NewNote, Note, NotePatch, SortSpec};

use crate::errors::ServiceError;

/// Repository abstraction for note persistence.
///
/// Absence is not an error here: `find_one` and `update` return `None` for an
/// unknown id and `delete` ignores ids that match nothing.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn find_all(&self, sort: Option<SortSpec>) -> Result<Vec<Note>, ServiceError>;
    async fn find_one(&self, id: &str) -> Result<Option<Note>, ServiceError>;
    async fn create(&self, input: NewNote) -> Result<Note, ServiceError>;
    async fn update(&self, id: &str, patch: NotePatch) -> Result<Option<Note>, ServiceError>;
    /// Remove every note whose id is in `ids`; returns how many were removed.
    async fn delete(&self, ids: &[String]) -> Result<usize, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct MockNoteRepository {
        notes: Mutex<Vec<Note>>,
        delete_calls: AtomicUsize,
    }

    impl MockNoteRepository {
        /// Number of times `delete` reached the repository.
        pub fn delete_calls(&self) -> usize {
            self.delete_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NoteRepository for MockNoteRepository {
        async fn find_all(&self, sort: Option<SortSpec>) -> Result<Vec<Note>, ServiceError> {
            let mut notes = self.notes.lock().await.clone();
            if let Some(spec) = sort {
                spec.sort(&mut notes);
            }
            Ok(notes)
        }

        async fn find_one(&self, id: &str) -> Result<Option<Note>, ServiceError> {
            Ok(self.notes.lock().await.iter().find(|n| n.id == id).cloned())
        }

        async fn create(&self, input: NewNote) -> Result<Note, ServiceError> {
            let note = Note::create(input);
            self.notes.lock().await.push(note.clone());
            Ok(note)
        }

        async fn update(&self, id: &str, patch: NotePatch) -> Result<Option<Note>, ServiceError> {
            let mut notes = self.notes.lock().await;
            Ok(notes.iter_mut().find(|n| n.id == id).map(|n| {
                n.apply(patch);
                n.clone()
            }))
        }

        async fn delete(&self, ids: &[String]) -> Result<usize, ServiceError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            let mut notes = self.notes.lock().await;
            let before = notes.len();
            notes.retain(|n| !ids.contains(&n.id));
            Ok(before - notes.len())
        }
    }
}
