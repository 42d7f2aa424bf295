use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::inbox::{InboxMessageRow, NewInboxMessage};
use crate::models::user::{PractitionerSummary, User};
use crate::state::AppState;

const MAX_SUBJECT_CHARS: usize = 200;
const MAX_BODY_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub subject: String,
    pub body: String,
    /// Member the message is about, if any.
    pub member_id: Option<Uuid>,
}

fn require_practitioner(user: &User) -> Result<(), AppError> {
    if user.is_practitioner() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn bounded(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// GET /api/v1/practitioners
pub async fn handle_list_practitioners(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<PractitionerSummary>>, AppError> {
    Ok(Json(state.store.list_practitioners().await?))
}

/// POST /api/v1/practitioners/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(practitioner_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<InboxMessageRow>), AppError> {
    let subject = bounded("subject", &req.subject, MAX_SUBJECT_CHARS)?;
    let body = bounded("body", &req.body, MAX_BODY_CHARS)?;

    state
        .store
        .get_practitioner(practitioner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Practitioner {practitioner_id} not found")))?;

    if let Some(member_id) = req.member_id {
        state
            .store
            .get_member(user.id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {member_id} not found")))?;
    }

    let message = state
        .store
        .send_inbox_message(&NewInboxMessage {
            practitioner_id,
            sender_id: user.id,
            member_id: req.member_id,
            subject,
            body,
        })
        .await?;

    info!(practitioner_id = %practitioner_id, message_id = %message.id, "Inbox message sent");
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/v1/inbox
pub async fn handle_list_inbox(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<InboxMessageRow>>, AppError> {
    require_practitioner(&user)?;
    Ok(Json(state.store.list_inbox(user.id).await?))
}

/// PATCH /api/v1/inbox/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InboxMessageRow>, AppError> {
    require_practitioner(&user)?;
    state
        .store
        .mark_inbox_read(user.id, id, Utc::now())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Message {id} not found")))
}
