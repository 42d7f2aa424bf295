use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::profile::{HealthProfileRow, ProfileUpdate};
use crate::models::user::User;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    /// Omit for the account holder's own profile.
    pub member_id: Option<Uuid>,
}

async fn ensure_member(state: &AppState, user: &User, member_id: Option<Uuid>) -> Result<(), AppError> {
    if let Some(id) = member_id {
        state
            .store
            .get_member(user.id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {id} not found")))?;
    }
    Ok(())
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<ProfileQuery>,
) -> Result<Json<HealthProfileRow>, AppError> {
    ensure_member(&state, &user, params.member_id).await?;
    state
        .store
        .get_profile(user.id, params.member_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No health profile recorded yet".to_string()))
}

/// PATCH /api/v1/profile
///
/// Applies only the fields present in the body. Unknown keys are rejected.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<ProfileQuery>,
    Json(body): Json<Value>,
) -> Result<Json<HealthProfileRow>, AppError> {
    let update = ProfileUpdate::from_json(body)?;
    ensure_member(&state, &user, params.member_id).await?;
    let profile = state
        .store
        .upsert_profile(user.id, params.member_id, &update)
        .await?;
    Ok(Json(profile))
}
