//! HTTP route handlers for the Wolkenlager API.
//!
//! - `auth`: registration, login and the current user
//! - `files`: listing, upload, download, rename, trash and access tracking
//! - `folders`: folder creation, rename, trash and deletion
//! - `trash`: the trash listing
//! - `health`: liveness, readiness, metrics and version

pub mod auth;
pub mod files;
pub mod folders;
pub mod health;
pub mod trash;

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_DISPOSITION;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::compression::predicate::{DefaultPredicate, Predicate};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::middleware;
use crate::state::AppState;

/// Compress like the default, except file downloads, which are streamed as
/// stored so `Content-Length` stays intact.
#[derive(Clone)]
struct NoDownloadsDefault(DefaultPredicate);

impl Predicate for NoDownloadsDefault {
    fn should_compress<B: axum::body::HttpBody>(&self, res: &axum::http::Response<B>) -> bool {
        !res.headers().contains_key(CONTENT_DISPOSITION) && self.0.should_compress(res)
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/metrics/prometheus", get(health::metrics_prometheus))
        .route("/version", get(health::version))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/files", get(files::list_contents))
        .route("/api/files/upload", post(files::upload))
        .route("/api/files/recent", get(files::list_recent))
        .route("/api/files/download/{id}", get(files::download))
        .route("/api/files/{id}", patch(files::rename).delete(files::delete_permanently))
        .route("/api/files/{id}/trash", patch(files::move_to_trash))
        .route("/api/files/{id}/restore", patch(files::restore))
        .route("/api/files/{id}/access", patch(files::record_access))
        .route("/api/folders", get(folders::list_folders).post(folders::create_folder))
        .route("/api/folders/{id}/rename", patch(folders::rename))
        .route("/api/folders/{id}", delete(folders::delete_permanently))
        .route("/api/folders/{id}/trash", patch(folders::move_to_trash))
        .route("/api/folders/{id}/restore", patch(folders::restore))
        .route("/api/trash", get(trash::list_trash))
}

/// The complete application: API routes, the optional static front end under
/// `public_dir` (with `index.html` fallback for client-side routing) and the
/// middleware stack.
pub fn router(state: AppState, public_dir: Option<&Path>) -> Router {
    let cfg = state.config.clone();
    let limiter = state.rate_limiter.clone();
    let max_request_bytes = cfg.storage.max_request_bytes;

    let mut app = api_routes();
    if let Some(dir) = public_dir {
        let static_ui_service = ServeDir::new(dir)
            .append_index_html_on_directories(true)
            .not_found_service(ServeFile::new(dir.join("index.html")));
        app = app.fallback_service(static_ui_service);
    }

    let compression = CompressionLayer::new().compress_when(NoDownloadsDefault(DefaultPredicate::new()));

    let app = app
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(from_fn_with_state(limiter, middleware::rate_limit::endpoint_rate_limit_middleware))
        .layer(from_fn_with_state(cfg.clone(), middleware::validation::validate_request_middleware))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(compression)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg, middleware::security_headers::security_headers_middleware));

    // CORS: permissive in debug builds for a separately served front end; same-origin in release
    if cfg!(debug_assertions) {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
