use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::drive::{entities, User};
use crate::error::AppError;
use crate::state::AppState;

/// The caller, resolved from an `Authorization: Bearer <jwt>` header.
///
/// Rejects with 401 when the header is missing or malformed, the token does
/// not verify or has expired, or its user no longer exists.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

        let claims = state
            .jwt
            .verify(token)
            .ok_or_else(|| AppError::Unauthorized("Not authorized, token failed".to_string()))?;

        let user = entities::find_user(&state.db, &claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Not authorized, user not found".to_string()))?;

        Ok(AuthUser(user))
    }
}
