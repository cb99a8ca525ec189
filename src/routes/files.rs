use std::io;

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::drive::{DriveError, Item, StagedFile};
use crate::error::{AppError, AppResult};
use crate::middleware::validation::{parse_id, parse_optional_id, sanitize_for_logging};
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::types::{
    ContentsDto, EntryDto, FileDto, ListQuery, PurgeResponse, RecentQuery, RenameRequest, UploadResponse,
};

/// Missing, zero or negative limits fall back to the default; everything is
/// capped at `max`.
pub fn resolve_recent_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    match requested {
        Some(n) if n > 0 => n.min(max),
        _ => default.min(max),
    }
}

/// `attachment` disposition with an ASCII fallback name and the exact name
/// in RFC 5987 encoding.
pub fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') { c } else { '_' })
        .collect();
    format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", fallback, urlencoding::encode(name))
}

/// Bodies cut off by the request size limit are 413, anything else is a
/// malformed request.
fn multipart_error(err: &MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        AppError::BadRequest(format!("Invalid multipart body: {}", err))
    }
}

/// Staging reads the part through an io adapter; unwrap multipart failures
/// from it again.
fn stage_error(err: DriveError, limit: usize) -> AppError {
    if let DriveError::Content(io_err) = &err {
        if let Some(multipart) = io_err.get_ref().and_then(|e| e.downcast_ref::<MultipartError>()) {
            return multipart_error(multipart, limit);
        }
    }
    err.into()
}

pub async fn list_contents(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<ContentsDto>> {
    let folder = parse_optional_id(q.folder_id.as_deref(), "Folder")?;
    let contents = state.drive.list_contents(user.id(), folder.as_deref()).await?;
    Ok(Json(contents.into()))
}

pub async fn list_recent(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<RecentQuery>,
) -> AppResult<Json<Vec<FileDto>>> {
    let storage = &state.config.storage;
    let limit = resolve_recent_limit(q.limit, storage.recent_default_limit, storage.recent_max_limit);
    let files = state.drive.list_recent(user.id(), limit).await?;
    Ok(Json(files.into_iter().map(Into::into).collect()))
}

/// Multipart upload: every `files` part is staged as it arrives, an optional
/// `folder_id` part selects the target folder. The batch is then accepted or
/// rejected as a whole.
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let max_file_bytes = state.config.storage.max_file_bytes;
    let max_request_bytes = state.config.storage.max_request_bytes;
    let mut staged: Vec<StagedFile> = Vec::new();
    let mut folder_id: Option<String> = None;

    let received = async {
        while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(&e, max_request_bytes))? {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some("files") | Some("file") => {
                    let name = field.file_name().unwrap_or_default().to_string();
                    let mime_type = field.content_type().map(str::to_string);
                    let reader = StreamReader::new(field.map_err(io::Error::other));
                    let file = state
                        .drive
                        .stage(&name, mime_type.as_deref(), reader, max_file_bytes)
                        .await
                        .map_err(|e| stage_error(e, max_request_bytes))?;
                    tracing::debug!("Staged {} ({} bytes)", sanitize_for_logging(&file.name), file.size);
                    staged.push(file);
                }
                Some("folder_id") => {
                    let value = field.text().await.map_err(|e| multipart_error(&e, max_request_bytes))?;
                    folder_id = parse_optional_id(Some(&value), "Folder")?;
                }
                other => tracing::debug!("Ignoring multipart field {:?}", other),
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(e) = received {
        state.drive.release_staged(&staged).await;
        state.metrics.inc_uploads_rejected();
        return Err(e);
    }

    match state.drive.upload_files(user.id(), staged, folder_id.as_deref()).await {
        Ok(files) => {
            let total_size: i64 = files.iter().map(|f| f.size).sum();
            state.metrics.record_upload(files.len() as u64, total_size.max(0) as u64);
            let files = files.into_iter().map(Into::into).collect();
            Ok((StatusCode::CREATED, Json(UploadResponse { files, total_size })))
        }
        Err(e) => {
            state.metrics.inc_uploads_rejected();
            Err(e.into())
        }
    }
}

pub async fn download(State(state): State<AppState>, user: AuthUser, Path(id): Path<String>) -> AppResult<Response> {
    let id = parse_id(&id, "File")?;
    let (file, reader) = state.drive.open_content(user.id(), &id).await?;
    state.metrics.inc_downloads();

    let headers = [
        (header::CONTENT_TYPE, file.mime_type.clone()),
        (header::CONTENT_LENGTH, file.size.to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&file.name)),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(reader))).into_response())
}

pub async fn rename(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> AppResult<Json<EntryDto>> {
    let item = Item::File(parse_id(&id, "File")?);
    let entry = state.drive.rename(user.id(), &item, &req.name).await?;
    Ok(Json(entry.into()))
}

pub async fn move_to_trash(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<EntryDto>> {
    let item = Item::File(parse_id(&id, "File")?);
    let entry = state.drive.move_to_trash(user.id(), &item).await?;
    state.metrics.inc_trashed();
    Ok(Json(entry.into()))
}

pub async fn restore(State(state): State<AppState>, user: AuthUser, Path(id): Path<String>) -> AppResult<Json<EntryDto>> {
    let item = Item::File(parse_id(&id, "File")?);
    let entry = state.drive.restore(user.id(), &item).await?;
    state.metrics.inc_restored();
    Ok(Json(entry.into()))
}

pub async fn delete_permanently(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<PurgeResponse>> {
    let item = Item::File(parse_id(&id, "File")?);
    let report = state.drive.delete_permanently(user.id(), &item).await?;
    state.metrics.record_purge(&report);
    Ok(Json(report.into()))
}

pub async fn record_access(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<FileDto>> {
    let id = parse_id(&id, "File")?;
    let file = state.drive.record_access(user.id(), &id).await?;
    Ok(Json(file.into()))
}
