use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::fmt::Write as _;

// Liveness probe - lightweight, no database access
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// Readiness probe: database reachable (with timeout) and upload directory present
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let query = sqlx::query("SELECT 1").fetch_one(&state.db);
    match tokio::time::timeout(std::time::Duration::from_secs(5), query).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => return (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {}", e)).into_response(),
        Err(_) => return (StatusCode::SERVICE_UNAVAILABLE, "not ready: timeout").into_response(),
    }

    match tokio::fs::metadata(&state.config.storage.upload_dir).await {
        Ok(meta) if meta.is_dir() => (StatusCode::OK, "ready").into_response(),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "not ready: upload directory missing").into_response(),
    }
}

// Metrics endpoint: returns JSON snapshot
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}

// Prometheus-compatible text exposition format
pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let m = state.metrics.get_snapshot();
    let series: [(&str, &str, &str, u64); 11] = [
        ("uploads_accepted", "counter", "Upload batches accepted", m.uploads_accepted),
        ("uploads_rejected", "counter", "Upload batches rejected", m.uploads_rejected),
        ("files_uploaded", "counter", "Files stored by accepted uploads", m.files_uploaded),
        ("bytes_uploaded", "counter", "Bytes stored by accepted uploads", m.bytes_uploaded),
        ("items_trashed", "counter", "Files and folders moved to trash", m.items_trashed),
        ("items_restored", "counter", "Files and folders restored from trash", m.items_restored),
        ("files_purged", "counter", "Files permanently deleted", m.files_purged),
        ("folders_purged", "counter", "Folders permanently deleted", m.folders_purged),
        ("bytes_purged", "counter", "Bytes released by permanent deletion", m.bytes_purged),
        ("downloads", "counter", "File downloads started", m.downloads),
        ("uptime_seconds", "gauge", "Uptime seconds", m.uptime_seconds),
    ];

    let mut body = String::new();
    for (name, kind, help, value) in series {
        let _ = write!(
            body,
            "# HELP wolkenlager_{name} {help}\n# TYPE wolkenlager_{name} {kind}\nwolkenlager_{name} {value}\n"
        );
    }
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

// Version/Build info endpoint (JSON)
pub async fn version() -> impl IntoResponse {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "authors": env!("CARGO_PKG_AUTHORS"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    });
    (StatusCode::OK, Json(body))
}
