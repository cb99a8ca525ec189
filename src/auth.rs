//! Accounts: registration, login and bearer tokens.
//!
//! Passwords are hashed with Argon2id (PHC string format). Tokens are HS256
//! JWTs whose `sub` is the user id.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::config::AuthConfig;
use crate::drive::{entities, DriveError, User};
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;

/// Hashes a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

/// Checks `password` against a stored PHC hash. A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl JwtKeys {
    pub fn new(cfg: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
            ttl_hours: i64::try_from(cfg.token_ttl_hours).unwrap_or(i64::MAX),
        }
    }

    pub fn issue(&self, user_id: &str) -> AppResult<String> {
        let now = chrono::Utc::now().timestamp();
        let exp = now.saturating_add(self.ttl_hours.saturating_mul(3600));
        let claims = Claims { sub: user_id.to_string(), iat: now, exp };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {}", e)))
    }

    /// Returns the claims of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Rejected bearer token: {}", e);
                None
            }
        }
    }
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError {
            field: field.to_string(),
            message: format!("{} is required", field),
        });
    }
    Ok(trimmed.to_string())
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = required("email", email)?.to_lowercase();
    let valid = email.len() <= MAX_EMAIL_LENGTH
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !valid {
        return Err(AppError::ValidationError {
            field: "email".to_string(),
            message: "Please enter a valid email address".to_string(),
        });
    }
    Ok(email)
}

fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
        return Err(AppError::ValidationError {
            field: "password".to_string(),
            message: format!(
                "Password must be between {} and {} characters",
                MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
            ),
        });
    }
    Ok(())
}

/// Creates an account with an empty drive and `storage_limit` bytes of quota.
pub async fn register(
    pool: &SqlitePool,
    storage_limit: i64,
    name: &str,
    email: &str,
    password: &str,
) -> AppResult<User> {
    let name = required("name", name)?;
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::ValidationError {
            field: "name".to_string(),
            message: format!("Name must be at most {} characters", MAX_NAME_LENGTH),
        });
    }
    let email = normalize_email(email)?;
    validate_password(password)?;

    if entities::find_user_by_email(pool, &email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("hashing task failed: {}", e)))??;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        email,
        password_hash,
        storage_used: 0,
        storage_limit,
        created_at: chrono::Utc::now().timestamp_millis(),
    };

    match entities::insert_user(pool, &user).await {
        Ok(()) => {}
        // Lost a race against a concurrent registration of the same address
        Err(DriveError::Database(sqlx::Error::Database(db_err))) if db_err.is_unique_violation() => {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!("Registered user {}", user.id);
    Ok(user)
}

/// Verifies credentials and issues a token. Unknown email and wrong password
/// produce the same error.
pub async fn login(pool: &SqlitePool, keys: &JwtKeys, email: &str, password: &str) -> AppResult<(String, User)> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(invalid());
    }

    let user = entities::find_user_by_email(pool, &email).await?.ok_or_else(invalid)?;

    let password = password.to_string();
    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("verification task failed: {}", e)))?;
    if !verified {
        return Err(invalid());
    }

    let token = keys.issue(&user.id)?;
    Ok((token, user))
}
