use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::types::ContentsDto;

/// Everything the caller has in the trash, newest first.
pub async fn list_trash(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ContentsDto>> {
    let trash = state.drive.list_trash(user.id()).await?;
    Ok(Json(trash.into()))
}
