use std::{collections::HashSet, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use models::{NewNote, Note, NotePatch, SortSpec};
use tracing::{debug, info, instrument};

use crate::errors::ServiceError;
use crate::notes::repository::NoteRepository;
use crate::storage::{JsonArrayStore, Outcome};

/// Notes persisted as one JSON array document on disk.
///
/// Every call loads the whole document; mutating calls rewrite it in full.
pub struct FileNoteRepository {
    store: JsonArrayStore<Note>,
}

impl FileNoteRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { store: JsonArrayStore::new(path) }
    }

    /// Build the repository and make sure its backing file exists.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let repo = Self::new(path);
        repo.initialize().await?;
        Ok(Arc::new(repo))
    }

    /// Create the data directory and an empty document when missing. Idempotent.
    pub async fn initialize(&self) -> Result<(), ServiceError> {
        self.store.initialize().await?;
        info!(path = %self.store.path().display(), "notes store ready");
        Ok(())
    }

    /// All notes in stored order; an unreadable document reads as empty.
    pub async fn load_all(&self) -> Vec<Note> {
        self.store.load_all().await
    }

    pub async fn replace_all(&self, notes: &[Note]) -> Result<(), ServiceError> {
        self.store.replace_all(notes).await
    }
}

#[async_trait]
impl NoteRepository for FileNoteRepository {
    async fn find_all(&self, sort: Option<SortSpec>) -> Result<Vec<Note>, ServiceError> {
        let mut notes = self.load_all().await;
        if let Some(spec) = sort {
            spec.sort(&mut notes);
        }
        Ok(notes)
    }

    async fn find_one(&self, id: &str) -> Result<Option<Note>, ServiceError> {
        Ok(self.load_all().await.into_iter().find(|n| n.id == id))
    }

    #[instrument(skip_all)]
    async fn create(&self, input: NewNote) -> Result<Note, ServiceError> {
        let note = self
            .store
            .update(|notes| {
                let note = Note::create(input);
                notes.push(note.clone());
                Ok(Outcome::persist(note))
            })
            .await?;
        info!(id = %note.id, "note_created");
        Ok(note)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &str, patch: NotePatch) -> Result<Option<Note>, ServiceError> {
        let updated = self
            .store
            .update(|notes| match notes.iter_mut().find(|n| n.id == id) {
                Some(note) => {
                    note.apply(patch);
                    Ok(Outcome::persist(Some(note.clone())))
                }
                None => Ok(Outcome::skip(None)),
            })
            .await?;
        match &updated {
            Some(note) => info!(id = %note.id, "note_updated"),
            None => debug!("note_update_missed"),
        }
        Ok(updated)
    }

    #[instrument(skip_all, fields(requested = ids.len()))]
    async fn delete(&self, ids: &[String]) -> Result<usize, ServiceError> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let deleted_count = self
            .store
            .update(|notes| {
                let before = notes.len();
                notes.retain(|n| !wanted.contains(n.id.as_str()));
                let removed = before - notes.len();
                if removed > 0 {
                    Ok(Outcome::persist(removed))
                } else {
                    Ok(Outcome::skip(0))
                }
            })
            .await?;
        info!(deleted_count, "notes_deleted");
        Ok(deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{SortField, SortOrder};
    use std::time::Duration;
    use uuid::Uuid;

    fn tmp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("svc_notes_{}", Uuid::new_v4()))
            .join("notes.json")
    }

    fn new_note(title: &str, content: &str) -> NewNote {
        NewNote::new(Some(title.into()), Some(content.into())).expect("valid input")
    }

    async fn cleanup(path: &std::path::Path) {
        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn crud_round_trip_persists() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let repo = FileNoteRepository::open(&path).await?;
        assert!(repo.find_all(None).await?.is_empty());

        let created = repo.create(new_note("First", "one")).await?;
        assert_eq!(created.created_at, created.modified_at);

        // reload from disk through a fresh instance
        let reopened = FileNoteRepository::open(&path).await?;
        let found = reopened.find_one(&created.id).await?.expect("note persisted");
        assert_eq!(found, created);

        tokio::time::sleep(Duration::from_millis(5)).await;
        let updated = reopened
            .update(&created.id, NotePatch { title: Some("Renamed".into()), content: None })
            .await?
            .expect("note exists");
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.content, "one");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.modified_at > updated.created_at);

        assert_eq!(repo.delete(&[created.id.clone()]).await?, 1);
        assert!(repo.find_one(&created.id).await?.is_none());

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_of_unknown_ids_are_soft() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let repo = FileNoteRepository::open(&path).await?;
        let kept = repo.create(new_note("Keep", "me")).await?;

        assert!(repo.update("missing", NotePatch::default()).await?.is_none());
        assert_eq!(repo.delete(&["missing".into()]).await?, 0);
        assert_eq!(repo.delete(&[]).await?, 0);
        assert_eq!(repo.load_all().await, vec![kept]);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_many_counts_only_matches() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let repo = FileNoteRepository::open(&path).await?;
        let a = repo.create(new_note("A", "a")).await?;
        let b = repo.create(new_note("B", "b")).await?;
        let c = repo.create(new_note("C", "c")).await?;

        let removed = repo.delete(&[a.id.clone(), b.id.clone(), "nope".into()]).await?;
        assert_eq!(removed, 2);
        assert!(repo.find_one(&a.id).await?.is_none());
        assert!(repo.find_one(&b.id).await?.is_none());
        assert_eq!(repo.find_all(None).await?, vec![c]);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn find_all_sorts_or_keeps_insertion_order() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let repo = FileNoteRepository::open(&path).await?;
        for (title, content) in [("b", "1"), ("C", "2"), ("A", "3")] {
            repo.create(new_note(title, content)).await?;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let titles = |notes: Vec<Note>| notes.into_iter().map(|n| n.title).collect::<Vec<_>>();
        assert_eq!(titles(repo.find_all(None).await?), ["b", "C", "A"]);
        let asc = SortSpec::new(SortField::Title, SortOrder::Asc);
        assert_eq!(titles(repo.find_all(Some(asc)).await?), ["A", "b", "C"]);
        let desc = SortSpec::new(SortField::CreatedAt, SortOrder::Desc);
        assert_eq!(titles(repo.find_all(Some(desc)).await?), ["A", "C", "b"]);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_document_reads_as_empty() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let repo = FileNoteRepository::open(&path).await?;
        tokio::fs::write(&path, b"[{\"id\": 1").await?;
        assert!(repo.find_all(None).await?.is_empty());
        assert!(repo.find_one("anything").await?.is_none());

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn replace_all_overwrites_document() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let repo = FileNoteRepository::open(&path).await?;
        repo.create(new_note("old", "x")).await?;

        let fresh = Note::create(new_note("fresh", "y"));
        repo.replace_all(std::slice::from_ref(&fresh)).await?;
        assert_eq!(repo.load_all().await, vec![fresh]);

        let raw: serde_json::Value = serde_json::from_slice(&tokio::fs::read(&path).await?)?;
        assert!(raw.is_array());
        assert!(raw[0]["createdAt"].is_string());

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_creates_are_not_lost() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let repo = FileNoteRepository::open(&path).await?;

        let mut tasks = Vec::new();
        for i in 0..32 {
            let repo = Arc::clone(&repo);
            tasks.push(tokio::spawn(async move {
                repo.create(new_note(&format!("note {i}"), "body")).await
            }));
        }
        let mut ids = HashSet::new();
        for t in tasks {
            ids.insert(t.await??.id);
        }
        assert_eq!(ids.len(), 32);

        let stored = repo.load_all().await;
        assert_eq!(stored.len(), 32);
        assert!(stored.iter().all(|n| ids.contains(&n.id)));

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_updates_and_deletes_stay_consistent() -> Result<(), anyhow::Error> {
        let path = tmp_path();
        let repo = FileNoteRepository::open(&path).await?;
        let mut created = Vec::new();
        for i in 0..10 {
            created.push(repo.create(new_note(&format!("n{i}"), "c")).await?);
        }

        let mut tasks = Vec::new();
        for (i, note) in created.iter().enumerate() {
            let repo = Arc::clone(&repo);
            let id = note.id.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    repo.delete(&[id]).await.map(|n| n == 1)
                } else {
                    repo.update(&id, NotePatch { title: None, content: Some("edited".into()) })
                        .await
                        .map(|n| n.is_some())
                }
            }));
        }
        for t in tasks {
            assert!(t.await??);
        }

        let stored = repo.load_all().await;
        assert_eq!(stored.len(), 5);
        assert!(stored.iter().all(|n| n.content == "edited"));

        cleanup(&path).await;
        Ok(())
    }
}
