//! Bearer-token authentication.
//!
//! Tokens are issued elsewhere; the API stores and looks up only their SHA-256
//! hash.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use tracing::debug;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// SHA-256 of a bearer token, as stored in `user_sessions.token_hash`.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// The authenticated caller. Extracting it rejects with 401 when the
/// `Authorization` header is missing, malformed, unknown or expired.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let hash = hash_token(token);

        match state.store.find_session_user(&hash, Utc::now()).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                debug!("Rejected unknown or expired session token");
                Err(AppError::Unauthorized)
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
