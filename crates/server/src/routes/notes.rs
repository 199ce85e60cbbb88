use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use models::{NoteDetail, NotePatch, NoteSummary, SortField, SortOrder, SortSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::JsonApiError;
use crate::routes::ServerState;

/// `GET /notes?orderBy=&order=`. Listing never fails on these values: an unknown
/// `orderBy` keeps stored order, and any `order` other than `asc` sorts descending.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
}

impl ListQuery {
    pub fn sort_spec(&self) -> Option<SortSpec> {
        let field = SortField::from_query(self.order_by.as_deref()?)?;
        let order = self.order.as_deref().map(SortOrder::from_query).unwrap_or_default();
        Some(SortSpec::new(field, order))
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateNoteInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DeleteNotesInput {
    #[serde(default)]
    pub ids: Option<Value>,
}

impl DeleteNotesInput {
    /// String entries of `ids`. Anything else in the list, or a non-list, is skipped.
    pub fn string_ids(self) -> Vec<String> {
        match self.ids {
            Some(Value::Array(items)) => {
                let total = items.len();
                let ids: Vec<String> = items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect();
                if ids.len() != total {
                    debug!(skipped = total - ids.len(), "ignoring non-string ids");
                }
                ids
            }
            Some(other) => {
                debug!(ids = %other, "ids is not a list; nothing to delete");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: usize,
}

/// List notes without content
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<NoteSummary>>, JsonApiError> {
    let q = match query {
        Ok(Query(q)) => q,
        Err(e) => {
            debug!(error = %e.body_text(), "unusable list query; listing in stored order");
            ListQuery::default()
        }
    };
    let notes = state.notes.list(q.sort_spec()).await?;
    Ok(Json(notes))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<NoteDetail>, JsonApiError> {
    Ok(Json(state.notes.get(&id).await?))
}

/// Create a note; `title` and `content` must both be non-empty strings.
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<CreateNoteInput>, JsonRejection>,
) -> Result<(StatusCode, Json<NoteDetail>), JsonApiError> {
    let Json(input) = payload?;
    let note = state.notes.create(input.title, input.content).await?;
    info!(id = %note.id, "created note");
    Ok((StatusCode::CREATED, Json(note)))
}

/// Partial update; absent fields stay as they are. A request without a JSON
/// body is an empty patch and only touches `modifiedAt`.
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<NotePatch>, JsonRejection>,
) -> Result<Json<NoteDetail>, JsonApiError> {
    let patch = match payload {
        Ok(Json(patch)) => patch,
        Err(JsonRejection::MissingJsonContentType(_)) => NotePatch::default(),
        Err(e) => return Err(e.into()),
    };
    let note = state.notes.update(&id, patch).await?;
    info!(id = %note.id, "updated note");
    Ok(Json(note))
}

/// Delete by path id. Unknown ids answer `{deletedCount: 0}`.
pub async fn delete_one(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, JsonApiError> {
    let deleted_count = state.notes.remove(&id).await?;
    Ok(Json(DeleteResult { deleted_count }))
}

/// Delete by `{ids: [...]}` body. A missing or unreadable body counts as an empty list.
pub async fn delete_many(
    State(state): State<ServerState>,
    body: Result<Json<DeleteNotesInput>, JsonRejection>,
) -> Result<Json<DeleteResult>, JsonApiError> {
    let ids = match body {
        Ok(Json(input)) => input.string_ids(),
        Err(e) => {
            debug!(error = %e.body_text(), "unusable delete body; nothing to delete");
            Vec::new()
        }
    };
    let deleted_count = state.notes.remove_many(&ids).await?;
    Ok(Json(DeleteResult { deleted_count }))
}
