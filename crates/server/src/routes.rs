use axum::{routing::get, Json, Router};
use service::notes::{repository::NoteRepository, NoteService};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

pub mod notes;

/// Shared handler state; the note service is constructed once at startup.
#[derive(Clone)]
pub struct ServerState {
    pub notes: NoteService<dyn NoteRepository>,
}

impl ServerState {
    pub fn new(notes: NoteService<dyn NoteRepository>) -> Self {
        Self { notes }
    }
}

pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Build the full application router with tracing and CORS layers.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let notes_routes = Router::new()
        .route(
            "/notes",
            get(notes::list).post(notes::create).delete(notes::delete_many),
        )
        .route(
            "/notes/:id",
            get(notes::get).patch(notes::update).delete(notes::delete_one),
        );

    Router::new()
        .route("/health", get(health))
        .merge(notes_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                        // 5xx responses
                        .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
                )
                .layer(cors),
        )
}
