//! Axum route handlers for conversations and chat turns.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::chat::service::{run_chat_turn, ChatTurnResponse};
use crate::errors::AppError;
use crate::models::conversation::{ConversationRow, TurnRow};
use crate::state::AppState;

const DEFAULT_TITLE: &str = "New conversation";
const MAX_TITLE_CHARS: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub title: Option<String>,
    /// Start the conversation about a family member or client instead of oneself.
    pub member_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ConversationDetailResponse {
    pub conversation: ConversationRow,
    pub turns: Vec<TurnRow>,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/conversations
pub async fn handle_list_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ConversationRow>>, AppError> {
    Ok(Json(state.store.list_conversations(user.id).await?))
}

/// POST /api/v1/conversations
pub async fn handle_create_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationRow>), AppError> {
    let title = match req.title.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_TITLE.to_string(),
        Some(t) if t.chars().count() > MAX_TITLE_CHARS => {
            return Err(AppError::Validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }
        Some(t) => t.to_string(),
    };

    if let Some(member_id) = req.member_id {
        state
            .store
            .get_member(user.id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {member_id} not found")))?;
    }

    let conversation = state
        .store
        .create_conversation(user.id, req.member_id, &title)
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET /api/v1/conversations/:id
pub async fn handle_get_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationDetailResponse>, AppError> {
    let conversation = state
        .store
        .get_conversation(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {id} not found")))?;
    let turns = state.store.list_turns(id).await?;
    Ok(Json(ConversationDetailResponse {
        conversation,
        turns,
    }))
}

/// POST /api/v1/conversations/:id/messages
///
/// Runs one chat turn. Emergency messages get the fixed safety reply and never
/// reach the model.
pub async fn handle_post_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<ChatTurnResponse>, AppError> {
    let response = run_chat_turn(&state, &user, id, &req.content).await?;
    Ok(Json(response))
}
