use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::drive::Item;
use crate::error::AppResult;
use crate::middleware::validation::{parse_id, parse_optional_id};
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::types::{CreateFolderRequest, EntryDto, FolderDto, PurgeResponse, RenameRequest};

pub async fn list_folders(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Vec<FolderDto>>> {
    let folders = state.drive.list_folders(user.id()).await?;
    Ok(Json(folders.into_iter().map(Into::into).collect()))
}

pub async fn create_folder(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> AppResult<(StatusCode, Json<FolderDto>)> {
    let parent = parse_optional_id(req.parent_id.as_deref(), "Folder")?;
    let folder = state.drive.create_folder(user.id(), &req.name, parent.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(folder.into())))
}

pub async fn rename(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> AppResult<Json<EntryDto>> {
    let item = Item::Folder(parse_id(&id, "Folder")?);
    let entry = state.drive.rename(user.id(), &item, &req.name).await?;
    Ok(Json(entry.into()))
}

pub async fn move_to_trash(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<EntryDto>> {
    let item = Item::Folder(parse_id(&id, "Folder")?);
    let entry = state.drive.move_to_trash(user.id(), &item).await?;
    state.metrics.inc_trashed();
    Ok(Json(entry.into()))
}

pub async fn restore(State(state): State<AppState>, user: AuthUser, Path(id): Path<String>) -> AppResult<Json<EntryDto>> {
    let item = Item::Folder(parse_id(&id, "Folder")?);
    let entry = state.drive.restore(user.id(), &item).await?;
    state.metrics.inc_restored();
    Ok(Json(entry.into()))
}

pub async fn delete_permanently(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<PurgeResponse>> {
    let item = Item::Folder(parse_id(&id, "Folder")?);
    let report = state.drive.delete_permanently(user.id(), &item).await?;
    state.metrics.record_purge(&report);
    Ok(Json(report.into()))
}
