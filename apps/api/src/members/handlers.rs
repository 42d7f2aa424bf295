use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::member::{MemberRow, NewMember};
use crate::state::AppState;

const MAX_NAME_CHARS: usize = 100;
const SEX_VALUES: &[&str] = &["female", "male", "other"];

fn validate_member(member: &NewMember) -> Result<(), AppError> {
    let name = member.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    if member.relationship.trim().is_empty() {
        return Err(AppError::Validation("relationship cannot be empty".to_string()));
    }
    if let Some(sex) = member.sex.as_deref() {
        if !SEX_VALUES.contains(&sex) {
            return Err(AppError::Validation(format!(
                "sex must be one of: {}",
                SEX_VALUES.join(", ")
            )));
        }
    }
    if let Some(dob) = member.date_of_birth {
        if dob > chrono::Utc::now().date_naive() {
            return Err(AppError::Validation(
                "date_of_birth cannot be in the future".to_string(),
            ));
        }
    }
    Ok(())
}

/// GET /api/v1/members
pub async fn handle_list_members(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<MemberRow>>, AppError> {
    Ok(Json(state.store.list_members(user.id).await?))
}

/// POST /api/v1/members
pub async fn handle_create_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<NewMember>,
) -> Result<(StatusCode, Json<MemberRow>), AppError> {
    validate_member(&req)?;
    let member = state.store.create_member(user.id, &req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// GET /api/v1/members/:id
pub async fn handle_get_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MemberRow>, AppError> {
    state
        .store
        .get_member(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Member {id} not found")))
}

/// DELETE /api/v1/members/:id
///
/// Also removes the member's health profile and conversations.
pub async fn handle_delete_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.store.delete_member(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Member {id} not found")))
    }
}
