//! riffle-sv library - sample server
//!
//! Serves randomly selected samples from a library directory and archives
//! accepted ones to cloud storage. Router construction lives here so the
//! integration tests can drive the full HTTP surface without a socket.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod archive;
pub mod error;
pub mod library;

pub use error::{Error, Result};

use archive::ArchiveService;
use library::SampleLibrary;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Sample library indexer
    pub library: Arc<SampleLibrary>,
    /// Archive service; `None` when no cloud credential is configured
    pub archive: Option<Arc<ArchiveService>>,
    /// Bearer token required on protected routes; `None` disables the gate
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(
        library: Arc<SampleLibrary>,
        archive: Option<Arc<ArchiveService>>,
        api_token: Option<String>,
    ) -> Self {
        Self {
            library,
            archive,
            api_token,
        }
    }
}

/// Build application router
///
/// Protected routes sit behind the bearer gate; health and auth status are
/// public.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/sample", get(api::handlers::get_sample))
        .route("/api/sample/:file", get(api::handlers::deliver_sample))
        .route("/api/add-to-drive", post(api::handlers::add_to_drive))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    let public = Router::new()
        .route("/health", get(api::handlers::health))
        .route("/auth/status", get(api::handlers::auth_status));

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
