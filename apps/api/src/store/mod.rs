//! Persistence collaborator.
//!
//! Handlers never hold process-wide mutable state; everything they read or
//! write goes through the `Store` carried in `AppState` as `Arc<dyn Store>`.
//! `PgStore` is the production implementation; `MemoryStore` backs handler tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::conversation::{ConversationRow, NewTurn, TurnRow};
use crate::models::inbox::{InboxMessageRow, NewInboxMessage};
use crate::models::member::{MemberRow, NewMember};
use crate::models::profile::{HealthProfileRow, ProfileUpdate};
use crate::models::user::{PractitionerSummary, User};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // ── accounts ──────────────────────────────────────────────────────────
    /// Resolves an unexpired session by the SHA-256 hash of its bearer token.
    async fn find_session_user(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError>;

    // ── members ───────────────────────────────────────────────────────────
    async fn create_member(&self, owner_id: Uuid, member: &NewMember) -> Result<MemberRow, AppError>;
    async fn list_members(&self, owner_id: Uuid) -> Result<Vec<MemberRow>, AppError>;
    async fn get_member(&self, owner_id: Uuid, member_id: Uuid)
        -> Result<Option<MemberRow>, AppError>;
    /// Returns `false` when no such member belongs to `owner_id`.
    async fn delete_member(&self, owner_id: Uuid, member_id: Uuid) -> Result<bool, AppError>;

    // ── health profiles ───────────────────────────────────────────────────
    async fn get_profile(
        &self,
        owner_id: Uuid,
        member_id: Option<Uuid>,
    ) -> Result<Option<HealthProfileRow>, AppError>;
    /// Creates the profile if needed, then applies only the fields present in `update`.
    async fn upsert_profile(
        &self,
        owner_id: Uuid,
        member_id: Option<Uuid>,
        update: &ProfileUpdate,
    ) -> Result<HealthProfileRow, AppError>;

    // ── conversations ─────────────────────────────────────────────────────
    async fn create_conversation(
        &self,
        owner_id: Uuid,
        member_id: Option<Uuid>,
        title: &str,
    ) -> Result<ConversationRow, AppError>;
    async fn list_conversations(&self, owner_id: Uuid) -> Result<Vec<ConversationRow>, AppError>;
    async fn get_conversation(
        &self,
        owner_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Option<ConversationRow>, AppError>;
    /// The newest `limit` turns, returned oldest first.
    async fn recent_turns(&self, conversation_id: Uuid, limit: usize)
        -> Result<Vec<TurnRow>, AppError>;
    async fn list_turns(&self, conversation_id: Uuid) -> Result<Vec<TurnRow>, AppError>;
    /// Appends a user turn and its reply atomically, and records the user turn
    /// in the usage ledger. Existing turns are never modified.
    async fn append_exchange(
        &self,
        conversation_id: Uuid,
        user_turn: &NewTurn,
        assistant_turn: &NewTurn,
    ) -> Result<(TurnRow, TurnRow), AppError>;

    // ── quota ─────────────────────────────────────────────────────────────
    /// User messages the owner has sent since `since`, counted from the usage
    /// ledger. Deleting members or conversations does not lower the count.
    async fn count_user_messages_since(
        &self,
        owner_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    // ── practitioner inbox ────────────────────────────────────────────────
    async fn list_practitioners(&self) -> Result<Vec<PractitionerSummary>, AppError>;
    async fn get_practitioner(
        &self,
        practitioner_id: Uuid,
    ) -> Result<Option<PractitionerSummary>, AppError>;
    async fn send_inbox_message(
        &self,
        message: &NewInboxMessage,
    ) -> Result<InboxMessageRow, AppError>;
    async fn list_inbox(&self, practitioner_id: Uuid) -> Result<Vec<InboxMessageRow>, AppError>;
    /// Returns `None` when the message is not in this practitioner's inbox.
    async fn mark_inbox_read(
        &self,
        practitioner_id: Uuid,
        message_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<InboxMessageRow>, AppError>;
}
