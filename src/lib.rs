pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::services::{candidate_service::CandidateStore, image_service::ImageStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CandidateStore>,
    pub images: ImageStore,
}

impl AppState {
    pub fn new(store: Arc<dyn CandidateStore>, images: ImageStore) -> Self {
        Self { store, images }
    }
}

/// Candidate API, health check and the static `/uploads` tree.
///
/// CORS and body-size limits depend on deployment config and are layered on
/// by the caller.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.images.uploads_dir());

    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/v1/candidates",
            get(routes::candidate_routes::list_candidates)
                .post(routes::candidate_routes::create_candidate),
        )
        .route(
            "/api/v1/candidates/:id",
            get(routes::candidate_routes::get_candidate)
                .put(routes::candidate_routes::update_candidate)
                .delete(routes::candidate_routes::delete_candidate),
        )
        .route(
            "/api/v1/candidates/election/:election_id",
            get(routes::candidate_routes::list_candidates_by_election),
        )
        .nest_service("/uploads", uploads)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
