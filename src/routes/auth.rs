use axum::{extract::State, http::StatusCode, Json};

use crate::auth;
use crate::error::AppResult;
use crate::middleware::{ip::ClientIp, validation::sanitize_for_logging, AuthUser};
use crate::state::AppState;
use crate::types::{AuthResponse, LoginRequest, RegisterRequest, UserDto};

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = auth::register(
        &state.db,
        state.config.storage.default_limit_bytes,
        &req.name,
        &req.email,
        &req.password,
    )
    .await?;
    let token = state.jwt.issue(&user.id)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user: user.into() })))
}

pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    match auth::login(&state.db, &state.jwt, &req.email, &req.password).await {
        Ok((token, user)) => {
            tracing::info!("User {} logged in from {}", user.id, ip);
            Ok(Json(AuthResponse { token, user: user.into() }))
        }
        Err(e) => {
            tracing::warn!("Failed login for '{}' from {}", sanitize_for_logging(&req.email), ip);
            Err(e)
        }
    }
}

pub async fn me(AuthUser(user): AuthUser) -> Json<UserDto> {
    Json(user.into())
}
