//! In-memory `Store` used by handler tests. State lives inside the instance
//! handed to `AppState`, never in a global.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::conversation::{ConversationRow, NewTurn, Role, TurnRow};
use crate::models::inbox::{InboxMessageRow, NewInboxMessage};
use crate::models::member::{MemberRow, NewMember};
use crate::models::profile::{HealthProfileRow, ProfileUpdate};
use crate::models::user::{PractitionerSummary, User};
use crate::store::Store;

struct Session {
    token_hash: Vec<u8>,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Data {
    users: Vec<User>,
    sessions: Vec<Session>,
    members: Vec<MemberRow>,
    profiles: Vec<HealthProfileRow>,
    conversations: Vec<ConversationRow>,
    turns: Vec<TurnRow>,
    inbox: Vec<InboxMessageRow>,
    /// Usage ledger: (owner, sent at) per user message. Never pruned by deletes.
    usage: Vec<(Uuid, DateTime<Utc>)>,
    next_seq: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Data>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, email: &str, role: &str, tier: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: Some(email.split('@').next().unwrap_or(email).to_string()),
            role: role.to_string(),
            tier: tier.to_string(),
            created_at: Utc::now(),
        };
        self.lock().users.push(user.clone());
        user
    }

    pub fn add_session(&self, user_id: Uuid, token_hash: Vec<u8>, ttl: Duration) {
        self.lock().sessions.push(Session {
            token_hash,
            user_id,
            expires_at: Utc::now() + ttl,
        });
    }

    /// Inserts a turn with an explicit timestamp (for quota-window tests).
    /// User turns are recorded in the usage ledger like stored exchanges.
    pub fn seed_turn(&self, conversation_id: Uuid, role: Role, content: &str, at: DateTime<Utc>) {
        let mut data = self.lock();
        if role == Role::User {
            data.record_usage(conversation_id, at);
        }
        data.next_seq += 1;
        let seq = data.next_seq;
        data.turns.push(TurnRow {
            id: Uuid::new_v4(),
            seq,
            conversation_id,
            role: role.as_str().to_string(),
            content: content.to_string(),
            tokens_used: None,
            emergency_flag: false,
            specialized_domain: None,
            created_at: at,
        });
    }

    pub fn turn_count(&self, conversation_id: Uuid) -> usize {
        self.lock()
            .turns
            .iter()
            .filter(|t| t.conversation_id == conversation_id)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Data> {
        self.data.lock().unwrap()
    }
}

impl Data {
    fn record_usage(&mut self, conversation_id: Uuid, at: DateTime<Utc>) {
        if let Some(owner_id) = self
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .map(|c| c.owner_id)
        {
            self.usage.push((owner_id, at));
        }
    }

    fn push_turn(&mut self, conversation_id: Uuid, turn: &NewTurn) -> TurnRow {
        self.next_seq += 1;
        let row = TurnRow {
            id: Uuid::new_v4(),
            seq: self.next_seq,
            conversation_id,
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
            tokens_used: turn.tokens_used,
            emergency_flag: turn.emergency_flag,
            specialized_domain: turn.specialized_domain.clone(),
            created_at: Utc::now(),
        };
        self.turns.push(row.clone());
        row
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_session_user(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let data = self.lock();
        let user = data
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash && s.expires_at > now)
            .and_then(|s| data.users.iter().find(|u| u.id == s.user_id))
            .cloned();
        Ok(user)
    }

    async fn create_member(&self, owner_id: Uuid, member: &NewMember) -> Result<MemberRow, AppError> {
        let row = MemberRow {
            id: Uuid::new_v4(),
            owner_id,
            name: member.name.trim().to_string(),
            relationship: member.relationship.trim().to_string(),
            date_of_birth: member.date_of_birth,
            sex: member.sex.clone(),
            created_at: Utc::now(),
        };
        self.lock().members.push(row.clone());
        Ok(row)
    }

    async fn list_members(&self, owner_id: Uuid) -> Result<Vec<MemberRow>, AppError> {
        Ok(self
            .lock()
            .members
            .iter()
            .filter(|m| m.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_member(
        &self,
        owner_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<MemberRow>, AppError> {
        Ok(self
            .lock()
            .members
            .iter()
            .find(|m| m.owner_id == owner_id && m.id == member_id)
            .cloned())
    }

    async fn delete_member(&self, owner_id: Uuid, member_id: Uuid) -> Result<bool, AppError> {
        let mut data = self.lock();
        let before = data.members.len();
        data.members
            .retain(|m| !(m.owner_id == owner_id && m.id == member_id));
        let removed = data.members.len() < before;
        if removed {
            data.profiles.retain(|p| p.member_id != Some(member_id));
            data.conversations.retain(|c| c.member_id != Some(member_id));
        }
        Ok(removed)
    }

    async fn get_profile(
        &self,
        owner_id: Uuid,
        member_id: Option<Uuid>,
    ) -> Result<Option<HealthProfileRow>, AppError> {
        let subject_id = member_id.unwrap_or(owner_id);
        Ok(self
            .lock()
            .profiles
            .iter()
            .find(|p| p.owner_id == owner_id && p.subject_id == subject_id)
            .cloned())
    }

    async fn upsert_profile(
        &self,
        owner_id: Uuid,
        member_id: Option<Uuid>,
        update: &ProfileUpdate,
    ) -> Result<HealthProfileRow, AppError> {
        let subject_id = member_id.unwrap_or(owner_id);
        let mut data = self.lock();
        if let Some(existing) = data
            .profiles
            .iter_mut()
            .find(|p| p.owner_id == owner_id && p.subject_id == subject_id)
        {
            existing.apply(update);
            return Ok(existing.clone());
        }
        let mut profile = HealthProfileRow::empty(owner_id, member_id);
        profile.apply(update);
        data.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn create_conversation(
        &self,
        owner_id: Uuid,
        member_id: Option<Uuid>,
        title: &str,
    ) -> Result<ConversationRow, AppError> {
        let now = Utc::now();
        let row = ConversationRow {
            id: Uuid::new_v4(),
            owner_id,
            member_id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.lock().conversations.push(row.clone());
        Ok(row)
    }

    async fn list_conversations(&self, owner_id: Uuid) -> Result<Vec<ConversationRow>, AppError> {
        let mut rows: Vec<ConversationRow> = self
            .lock()
            .conversations
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn get_conversation(
        &self,
        owner_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Option<ConversationRow>, AppError> {
        Ok(self
            .lock()
            .conversations
            .iter()
            .find(|c| c.owner_id == owner_id && c.id == conversation_id)
            .cloned())
    }

    async fn recent_turns(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<TurnRow>, AppError> {
        let all = self.list_turns(conversation_id).await?;
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }

    async fn list_turns(&self, conversation_id: Uuid) -> Result<Vec<TurnRow>, AppError> {
        let mut turns: Vec<TurnRow> = self
            .lock()
            .turns
            .iter()
            .filter(|t| t.conversation_id == conversation_id)
            .cloned()
            .collect();
        turns.sort_by_key(|t| t.seq);
        Ok(turns)
    }

    async fn append_exchange(
        &self,
        conversation_id: Uuid,
        user_turn: &NewTurn,
        assistant_turn: &NewTurn,
    ) -> Result<(TurnRow, TurnRow), AppError> {
        let mut data = self.lock();
        let user = data.push_turn(conversation_id, user_turn);
        data.record_usage(conversation_id, user.created_at);
        let assistant = data.push_turn(conversation_id, assistant_turn);
        if let Some(c) = data.conversations.iter_mut().find(|c| c.id == conversation_id) {
            c.updated_at = Utc::now();
        }
        Ok((user, assistant))
    }

    async fn count_user_messages_since(
        &self,
        owner_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count = self
            .lock()
            .usage
            .iter()
            .filter(|(owner, at)| *owner == owner_id && *at >= since)
            .count();
        Ok(count as i64)
    }

    async fn list_practitioners(&self) -> Result<Vec<PractitionerSummary>, AppError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| u.is_practitioner())
            .map(|u| PractitionerSummary {
                id: u.id,
                display_name: u.display_name.clone(),
            })
            .collect())
    }

    async fn get_practitioner(
        &self,
        practitioner_id: Uuid,
    ) -> Result<Option<PractitionerSummary>, AppError> {
        Ok(self
            .list_practitioners()
            .await?
            .into_iter()
            .find(|p| p.id == practitioner_id))
    }

    async fn send_inbox_message(
        &self,
        message: &NewInboxMessage,
    ) -> Result<InboxMessageRow, AppError> {
        let row = InboxMessageRow {
            id: Uuid::new_v4(),
            practitioner_id: message.practitioner_id,
            sender_id: message.sender_id,
            member_id: message.member_id,
            subject: message.subject.clone(),
            body: message.body.clone(),
            read_at: None,
            created_at: Utc::now(),
        };
        self.lock().inbox.push(row.clone());
        Ok(row)
    }

    async fn list_inbox(&self, practitioner_id: Uuid) -> Result<Vec<InboxMessageRow>, AppError> {
        let mut rows: Vec<InboxMessageRow> = self
            .lock()
            .inbox
            .iter()
            .filter(|m| m.practitioner_id == practitioner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn mark_inbox_read(
        &self,
        practitioner_id: Uuid,
        message_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<InboxMessageRow>, AppError> {
        let mut data = self.lock();
        let Some(message) = data
            .inbox
            .iter_mut()
            .find(|m| m.id == message_id && m.practitioner_id == practitioner_id)
        else {
            return Ok(None);
        };
        message.read_at.get_or_insert(now);
        Ok(Some(message.clone()))
    }
}
