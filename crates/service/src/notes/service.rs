use std::sync::Arc;

use models::{NewNote, NoteDetail, NotePatch, NoteSummary, SortSpec};
use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::notes::repository::NoteRepository;

/// Note business service independent of web framework.
///
/// Shapes repository results into list/detail views and turns absence on
/// get/update into `NotFound`. Delete stays tolerant of unknown ids.
pub struct NoteService<R: NoteRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: NoteRepository + ?Sized> Clone for NoteService<R> {
    fn clone(&self) -> Self { Self { repo: Arc::clone(&self.repo) } }
}

impl<R: NoteRepository + ?Sized> NoteService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// List notes without content, optionally sorted.
    pub async fn list(&self, sort: Option<SortSpec>) -> Result<Vec<NoteSummary>, ServiceError> {
        let notes = self.repo.find_all(sort).await?;
        Ok(notes.into_iter().map(NoteSummary::from).collect())
    }

    pub async fn get(&self, id: &str) -> Result<NoteDetail, ServiceError> {
        self.repo
            .find_one(id)
            .await?
            .map(NoteDetail::from)
            .ok_or_else(|| ServiceError::not_found("Note", id))
    }

    /// Create a note. Title and content are required and must be non-empty;
    /// invalid input is rejected before the repository is touched.
    ///
    /// # Examples
    /// ```
    /// use service::notes::{repository::mock::MockNoteRepository, NoteService};
    /// use std::sync::Arc;
    /// let svc = NoteService::new(Arc::new(MockNoteRepository::default()));
    /// let note = tokio_test::block_on(svc.create(Some("Groceries".into()), Some("milk".into()))).unwrap();
    /// assert_eq!(note.title, "Groceries");
    /// assert_eq!(note.created_at, note.modified_at);
    /// assert!(tokio_test::block_on(svc.create(Some("".into()), Some("x".into()))).is_err());
    /// ```
    #[instrument(skip_all)]
    pub async fn create(&self, title: Option<String>, content: Option<String>) -> Result<NoteDetail, ServiceError> {
        let input = NewNote::new(title, content)?;
        let note = self.repo.create(input).await?;
        Ok(note.into())
    }

    /// Apply a partial update.
    ///
    /// # Examples
    /// ```
    /// use models::NotePatch;
    /// use service::{errors::ServiceError, notes::{repository::mock::MockNoteRepository, NoteService}};
    /// use std::sync::Arc;
    /// let svc = NoteService::new(Arc::new(MockNoteRepository::default()));
    /// let patch = NotePatch { title: Some("x".into()), content: None };
    /// let res = tokio_test::block_on(svc.update("missing", patch));
    /// assert!(matches!(res, Err(ServiceError::NotFound(_))));
    /// ```
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: NotePatch) -> Result<NoteDetail, ServiceError> {
        self.repo
            .update(id, patch)
            .await?
            .map(NoteDetail::from)
            .ok_or_else(|| ServiceError::not_found("Note", id))
    }

    /// Delete a single note; an unknown id yields `0`.
    pub async fn remove(&self, id: &str) -> Result<usize, ServiceError> {
        self.repo.delete(&[id.to_string()]).await
    }

    /// Delete many notes. An empty id list returns `0` without reaching the repository.
    pub async fn remove_many(&self, ids: &[String]) -> Result<usize, ServiceError> {
        if ids.is_empty() {
            debug!("empty id list; nothing to delete");
            return Ok(0);
        }
        self.repo.delete(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::repository::mock::MockNoteRepository;
    use models::{SortField, SortOrder};

    fn svc() -> (Arc<MockNoteRepository>, NoteService<MockNoteRepository>) {
        let repo = Arc::new(MockNoteRepository::default());
        (Arc::clone(&repo), NoteService::new(repo))
    }

    #[tokio::test]
    async fn list_returns_summaries_in_requested_order() -> Result<(), anyhow::Error> {
        let (_, svc) = svc();
        svc.create(Some("B".into()), Some("b".into())).await?;
        svc.create(Some("a".into()), Some("a".into())).await?;

        let plain = svc.list(None).await?;
        assert_eq!(plain.iter().map(|n| n.title.as_str()).collect::<Vec<_>>(), ["B", "a"]);

        let sorted = svc.list(Some(SortSpec::new(SortField::Title, SortOrder::Asc))).await?;
        assert_eq!(sorted.iter().map(|n| n.title.as_str()).collect::<Vec<_>>(), ["a", "B"]);

        let json = serde_json::to_value(&sorted)?;
        assert!(json[0].get("content").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn get_and_update_report_not_found() {
        let (_, svc) = svc();
        assert!(matches!(svc.get("nope").await, Err(ServiceError::NotFound(_))));
        let err = svc.update("nope", NotePatch::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Note with ID nope not found");
    }

    #[tokio::test]
    async fn create_validates_before_persisting() -> Result<(), anyhow::Error> {
        let (_, svc) = svc();
        assert!(matches!(svc.create(Some("".into()), Some("c".into())).await, Err(ServiceError::Model(_))));
        assert!(matches!(svc.create(Some("t".into()), None).await, Err(ServiceError::Model(_))));
        assert!(svc.list(None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn get_returns_what_create_returned() -> Result<(), anyhow::Error> {
        let (_, svc) = svc();
        let created = svc.create(Some("t".into()), Some("c".into())).await?;
        assert_eq!(svc.get(&created.id).await?, created);
        Ok(())
    }

    #[tokio::test]
    async fn partial_update_keeps_other_field() -> Result<(), anyhow::Error> {
        let (_, svc) = svc();
        let created = svc.create(Some("t".into()), Some("c".into())).await?;
        let updated = svc.update(&created.id, NotePatch { title: None, content: Some("".into()) }).await?;
        assert_eq!(updated.title, "t");
        assert_eq!(updated.content, "");
        assert!(updated.modified_at >= created.modified_at);
        Ok(())
    }

    #[tokio::test]
    async fn remove_is_tolerant_and_remove_many_short_circuits() -> Result<(), anyhow::Error> {
        let (repo, svc) = svc();
        let a = svc.create(Some("a".into()), Some("a".into())).await?;
        let b = svc.create(Some("b".into()), Some("b".into())).await?;

        assert_eq!(svc.remove("missing").await?, 0);
        assert_eq!(repo.delete_calls(), 1);

        assert_eq!(svc.remove_many(&[]).await?, 0);
        assert_eq!(repo.delete_calls(), 1);

        assert_eq!(svc.remove_many(&[a.id.clone(), b.id.clone()]).await?, 2);
        assert!(matches!(svc.get(&a.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.get(&b.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
