//! One chat turn, end to end.
//!
//! validate → safety gate → (emergency reply) | (quota → route + assemble → model)
//! → append the exchange. The gate runs before the quota so emergency replies
//! are delivered even to accounts over their monthly allowance, and before the
//! router so a flagged utterance is never routed or forwarded.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::quota::{check_quota, monthly_usage};
use crate::errors::AppError;
use crate::models::conversation::{ConversationRow, NewTurn, Role, TurnRow};
use crate::models::user::User;
use crate::state::AppState;
use crate::triage::prompt_assembly::HISTORY_TURNS;
use crate::triage::{ProfileSummary, Screening};

#[derive(Debug, Serialize)]
pub struct ChatTurnResponse {
    pub conversation_id: Uuid,
    pub user_turn: TurnRow,
    pub assistant_turn: TurnRow,
    /// Emergency phrases found in the message; empty when none.
    pub flagged_symptoms: Vec<String>,
}

pub async fn run_chat_turn(
    state: &AppState,
    user: &User,
    conversation_id: Uuid,
    content: &str,
) -> Result<ChatTurnResponse, AppError> {
    let utterance = state.pipeline.validate(content)?;

    let conversation = state
        .store
        .get_conversation(user.id, conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id} not found")))?;

    if let Screening::Emergency { content, matched } = state.pipeline.screen(utterance) {
        warn!(
            conversation_id = %conversation_id,
            matched = ?matched,
            "Emergency phrases detected; model not contacted"
        );
        let user_turn = NewTurn {
            emergency_flag: true,
            ..NewTurn::user(utterance)
        };
        let reply = NewTurn {
            role: Role::Assistant,
            content,
            tokens_used: None,
            emergency_flag: true,
            specialized_domain: None,
        };
        let (user_turn, assistant_turn) = state
            .store
            .append_exchange(conversation_id, &user_turn, &reply)
            .await?;
        return Ok(ChatTurnResponse {
            conversation_id,
            user_turn,
            assistant_turn,
            flagged_symptoms: matched,
        });
    }

    let usage = monthly_usage(state.store.as_ref(), user.id, user.tier(), Utc::now()).await?;
    if let Err(e) = check_quota(usage.tier, usage.used) {
        info!(user_id = %user.id, used = usage.used, "Monthly quota reached");
        return Err(e);
    }

    let profile = load_profile_summary(state, user, &conversation).await?;
    let history = state
        .store
        .recent_turns(conversation_id, HISTORY_TURNS)
        .await?;

    let payload = state.pipeline.prepare(utterance, &profile, &history);
    debug!(
        conversation_id = %conversation_id,
        domain = ?payload.specialized_domain,
        system_chars = payload.system.chars().count(),
        "Prompt assembled"
    );

    let completion = state
        .llm
        .complete(&payload.system, &payload.messages, payload.max_tokens)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let reply = NewTurn {
        role: Role::Assistant,
        content: completion.text,
        tokens_used: completion.tokens_used.and_then(|t| i32::try_from(t).ok()),
        emergency_flag: false,
        specialized_domain: payload.specialized_domain,
    };
    let (user_turn, assistant_turn) = state
        .store
        .append_exchange(conversation_id, &NewTurn::user(utterance), &reply)
        .await?;

    Ok(ChatTurnResponse {
        conversation_id,
        user_turn,
        assistant_turn,
        flagged_symptoms: vec![],
    })
}

/// Profile of whoever the conversation is about: a member, or the account holder.
async fn load_profile_summary(
    state: &AppState,
    user: &User,
    conversation: &ConversationRow,
) -> Result<ProfileSummary, AppError> {
    let display_name = match conversation.member_id {
        Some(member_id) => state
            .store
            .get_member(user.id, member_id)
            .await?
            .map(|m| m.name),
        None => user.display_name.clone(),
    };

    let profile = state
        .store
        .get_profile(user.id, conversation.member_id)
        .await?;

    Ok(match profile {
        Some(p) => p.summary(display_name),
        None => ProfileSummary {
            display_name,
            ..ProfileSummary::default()
        },
    })
}
