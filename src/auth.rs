// src/auth.rs
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, AppResult, StoreError};
use crate::models::{NewUser, User, UserId};
use crate::session::SessionIssuer;
use crate::state::AppState;
use crate::store::Store;

pub const MIN_PASSWORD_LEN: usize = 8;

const BAD_CREDENTIALS: &str = "invalid credentials";

pub fn hash_password(password: &str) -> AppResult<String> {
    Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

/// Create an account. Emails are stored lower-cased.
pub async fn register(
    store: &dyn Store,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<User> {
    let username = username.trim();
    let email = email.trim().to_lowercase();

    if username.is_empty() {
        return Err(AppError::InvalidInput("username must not be empty".into()));
    }
    if !email.contains('@') {
        return Err(AppError::InvalidInput("email address is not valid".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // Argon2 is CPU-bound, run it off the async workers
    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))??;

    let user = store
        .create_user(NewUser {
            username: username.to_string(),
            email,
            password_hash,
        })
        .await
        .map_err(|err| match err {
            StoreError::UniqueViolation(constraint) if constraint.contains("email") => {
                AppError::Conflict("email is already registered".into())
            }
            StoreError::UniqueViolation(_) => {
                AppError::Conflict("username or email is already registered".into())
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Check credentials and hand back a bearer token.
pub async fn login(
    store: &dyn Store,
    sessions: &SessionIssuer,
    email: &str,
    password: &str,
) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let Some(user) = store.find_user_by_email(&email).await? else {
        tracing::warn!(email = %email, "login for unknown email");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    let password = password.to_string();
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password check task failed: {e}")))?;

    if !valid {
        tracing::warn!(user_id = user.id, "login with wrong password");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    tracing::info!(user_id = user.id, "user logged in");
    sessions.issue(user.id, &user.username)
}

/// The user id carried by a valid `Authorization: Bearer <token>` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

        let claims = state.sessions.validate(token)?;
        Ok(AuthUser(claims.user_id))
    }
}
