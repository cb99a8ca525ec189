use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Rejects requests with traversal sequences in the URI (400) or a declared
/// `Content-Length` above `storage.max_request_bytes` (413), and logs
/// suspicious user agents.
pub async fn validate_request_middleware(
    State(cfg): State<Arc<AppConfig>>,
    req: Request,
    next: Next,
) -> Response {
    if contains_path_traversal(req.uri().path()) {
        return AppError::BadRequest("Path traversal detected in request".to_string()).into_response();
    }

    if let Some(ua_str) = req.headers().get("user-agent").and_then(|ua| ua.to_str().ok()) {
        if is_suspicious_user_agent(ua_str) {
            tracing::warn!("Suspicious user agent detected: {}", sanitize_for_logging(ua_str));
        }
    }

    // Early rejection; DefaultBodyLimit enforces the same limit while streaming
    if matches!(req.method(), &Method::POST | &Method::PUT | &Method::PATCH) {
        let declared = req
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        let max_body_size = cfg.storage.max_request_bytes;
        if let Some(length) = declared {
            if length > max_body_size {
                return AppError::PayloadTooLarge { limit: max_body_size }.into_response();
            }
        }
    }

    next.run(req).await
}

fn contains_path_traversal(path: &str) -> bool {
    let lower = path.to_lowercase();

    if path.contains("/..") || path.contains("\\..") || path.starts_with("..") {
        return true;
    }
    if path.contains("/./") || path.contains("\\.\\") || path.contains("....") {
        return true;
    }

    // Single and double URL-encoded variants
    let encoded_patterns = [
        "%2e%2e", "%252e%252e", "%2e/", "%252e%2f", "/%2e", "%2f%2e", "%2e\\", "%2e%5c", "%5c%2e", "%5c%5c",
        "%00",
    ];
    if encoded_patterns.iter().any(|pattern| lower.contains(pattern)) {
        return true;
    }

    path.contains('\0')
}

fn is_suspicious_user_agent(ua: &str) -> bool {
    let ua_lower = ua.to_lowercase();
    ua_lower.contains("scanner")
        || (ua_lower.contains("crawler") && !ua_lower.contains("googlebot") && !ua_lower.contains("bingbot"))
        || ua_lower.contains("nikto")
        || ua_lower.contains("sqlmap")
        || ua_lower.contains("havij")
        || ua_lower.contains("acunetix")
}

/// Normalizes an item id taken from the path or a form field.
///
/// Ids are UUIDs. Anything that does not parse cannot name an existing item
/// and is reported as `NotFound`, the same as an unknown id.
pub fn parse_id(id: &str, entity: &str) -> AppResult<String> {
    Uuid::parse_str(id.trim())
        .map(|uuid| uuid.to_string())
        .map_err(|_| AppError::NotFound(format!("{} not found", entity)))
}

/// Like [`parse_id`] for optional folder references, where an empty value or
/// the literal `"null"` means the root.
pub fn parse_optional_id(id: Option<&str>, entity: &str) -> AppResult<Option<String>> {
    match id.map(str::trim) {
        None | Some("") | Some("null") => Ok(None),
        Some(id) => parse_id(id, entity).map(Some),
    }
}

/// Strips control characters, limits the length and escapes quotes so user
/// input can be logged safely.
pub fn sanitize_for_logging(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .take(200)
        .collect::<String>()
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\'', "\\\'")
}
