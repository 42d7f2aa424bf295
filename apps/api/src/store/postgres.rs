use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::conversation::{ConversationRow, NewTurn, Role, TurnRow};
use crate::models::inbox::{InboxMessageRow, NewInboxMessage};
use crate::models::member::{MemberRow, NewMember};
use crate::models::profile::{HealthProfileRow, ProfileUpdate};
use crate::models::user::{PractitionerSummary, User};
use crate::store::Store;

/// Postgres-backed store. Chat turns are append-only: rows in `chat_turns`
/// are only ever INSERTed.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_TURN: &str = r#"
    INSERT INTO chat_turns
        (id, conversation_id, role, content, tokens_used, emergency_flag, specialized_domain)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING *
"#;

#[async_trait]
impl Store for PgStore {
    async fn find_session_user(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT u.*
            FROM user_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_member(&self, owner_id: Uuid, member: &NewMember) -> Result<MemberRow, AppError> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            INSERT INTO members (id, owner_id, name, relationship, date_of_birth, sex)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(member.name.trim())
        .bind(member.relationship.trim())
        .bind(member.date_of_birth)
        .bind(member.sex.as_deref())
        .fetch_one(&self.pool)
        .await?;

        info!("Created member {} for user {owner_id}", row.id);
        Ok(row)
    }

    async fn list_members(&self, owner_id: Uuid) -> Result<Vec<MemberRow>, AppError> {
        Ok(sqlx::query_as::<_, MemberRow>(
            "SELECT * FROM members WHERE owner_id = $1 ORDER BY created_at ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_member(
        &self,
        owner_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<MemberRow>, AppError> {
        Ok(sqlx::query_as::<_, MemberRow>(
            "SELECT * FROM members WHERE id = $1 AND owner_id = $2",
        )
        .bind(member_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_member(&self, owner_id: Uuid, member_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1 AND owner_id = $2")
            .bind(member_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_profile(
        &self,
        owner_id: Uuid,
        member_id: Option<Uuid>,
    ) -> Result<Option<HealthProfileRow>, AppError> {
        Ok(sqlx::query_as::<_, HealthProfileRow>(
            "SELECT * FROM health_profiles WHERE owner_id = $1 AND subject_id = $2",
        )
        .bind(owner_id)
        .bind(member_id.unwrap_or(owner_id))
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert_profile(
        &self,
        owner_id: Uuid,
        member_id: Option<Uuid>,
        update: &ProfileUpdate,
    ) -> Result<HealthProfileRow, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, HealthProfileRow>(
            "SELECT * FROM health_profiles WHERE owner_id = $1 AND subject_id = $2 FOR UPDATE",
        )
        .bind(owner_id)
        .bind(member_id.unwrap_or(owner_id))
        .fetch_optional(&mut *tx)
        .await?;

        let mut profile = existing.unwrap_or_else(|| HealthProfileRow::empty(owner_id, member_id));
        profile.apply(update);

        let saved = sqlx::query_as::<_, HealthProfileRow>(
            r#"
            INSERT INTO health_profiles
                (id, owner_id, subject_id, member_id, constitution, age_band, conditions,
                 allergies, medications, preferred_domains, notes, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (owner_id, subject_id) DO UPDATE SET
                constitution = EXCLUDED.constitution,
                age_band = EXCLUDED.age_band,
                conditions = EXCLUDED.conditions,
                allergies = EXCLUDED.allergies,
                medications = EXCLUDED.medications,
                preferred_domains = EXCLUDED.preferred_domains,
                notes = EXCLUDED.notes,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(profile.owner_id)
        .bind(profile.subject_id)
        .bind(profile.member_id)
        .bind(&profile.constitution)
        .bind(&profile.age_band)
        .bind(&profile.conditions)
        .bind(&profile.allergies)
        .bind(&profile.medications)
        .bind(&profile.preferred_domains)
        .bind(&profile.notes)
        .bind(profile.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn create_conversation(
        &self,
        owner_id: Uuid,
        member_id: Option<Uuid>,
        title: &str,
    ) -> Result<ConversationRow, AppError> {
        Ok(sqlx::query_as::<_, ConversationRow>(
            r#"
            INSERT INTO conversations (id, owner_id, member_id, title)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(member_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_conversations(&self, owner_id: Uuid) -> Result<Vec<ConversationRow>, AppError> {
        Ok(sqlx::query_as::<_, ConversationRow>(
            "SELECT * FROM conversations WHERE owner_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_conversation(
        &self,
        owner_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Option<ConversationRow>, AppError> {
        Ok(sqlx::query_as::<_, ConversationRow>(
            "SELECT * FROM conversations WHERE id = $1 AND owner_id = $2",
        )
        .bind(conversation_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn recent_turns(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<TurnRow>, AppError> {
        Ok(sqlx::query_as::<_, TurnRow>(
            r#"
            SELECT * FROM (
                SELECT * FROM chat_turns
                WHERE conversation_id = $1
                ORDER BY seq DESC
                LIMIT $2
            ) recent
            ORDER BY seq ASC
            "#,
        )
        .bind(conversation_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_turns(&self, conversation_id: Uuid) -> Result<Vec<TurnRow>, AppError> {
        Ok(sqlx::query_as::<_, TurnRow>(
            "SELECT * FROM chat_turns WHERE conversation_id = $1 ORDER BY seq ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn append_exchange(
        &self,
        conversation_id: Uuid,
        user_turn: &NewTurn,
        assistant_turn: &NewTurn,
    ) -> Result<(TurnRow, TurnRow), AppError> {
        let mut tx = self.pool.begin().await?;

        let mut saved = Vec::with_capacity(2);
        for turn in [user_turn, assistant_turn] {
            let row = sqlx::query_as::<_, TurnRow>(INSERT_TURN)
                .bind(Uuid::new_v4())
                .bind(conversation_id)
                .bind(turn.role.as_str())
                .bind(&turn.content)
                .bind(turn.tokens_used)
                .bind(turn.emergency_flag)
                .bind(turn.specialized_domain.as_deref())
                .fetch_one(&mut *tx)
                .await?;

            if turn.role == Role::User {
                sqlx::query(
                    r#"
                    INSERT INTO message_usage (id, owner_id, created_at)
                    SELECT $1, owner_id, $2 FROM conversations WHERE id = $3
                    "#,
                )
                .bind(row.id)
                .bind(row.created_at)
                .bind(conversation_id)
                .execute(&mut *tx)
                .await?;
            }
            saved.push(row);
        }

        sqlx::query("UPDATE conversations SET updated_at = now() WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let assistant = saved.pop();
        let user = saved.pop();
        match (user, assistant) {
            (Some(user), Some(assistant)) => Ok((user, assistant)),
            _ => Err(AppError::Internal(anyhow::anyhow!(
                "append_exchange did not return both turns"
            ))),
        }
    }

    async fn count_user_messages_since(
        &self,
        owner_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM message_usage
            WHERE owner_id = $1 AND created_at >= $2
            "#,
        )
        .bind(owner_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_practitioners(&self) -> Result<Vec<PractitionerSummary>, AppError> {
        Ok(sqlx::query_as::<_, PractitionerSummary>(
            "SELECT id, display_name FROM users WHERE role = 'practitioner' ORDER BY display_name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_practitioner(
        &self,
        practitioner_id: Uuid,
    ) -> Result<Option<PractitionerSummary>, AppError> {
        Ok(sqlx::query_as::<_, PractitionerSummary>(
            "SELECT id, display_name FROM users WHERE id = $1 AND role = 'practitioner'",
        )
        .bind(practitioner_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn send_inbox_message(
        &self,
        message: &NewInboxMessage,
    ) -> Result<InboxMessageRow, AppError> {
        let row = sqlx::query_as::<_, InboxMessageRow>(
            r#"
            INSERT INTO inbox_messages (id, practitioner_id, sender_id, member_id, subject, body)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.practitioner_id)
        .bind(message.sender_id)
        .bind(message.member_id)
        .bind(&message.subject)
        .bind(&message.body)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Inbox message {} delivered to practitioner {}",
            row.id, row.practitioner_id
        );
        Ok(row)
    }

    async fn list_inbox(&self, practitioner_id: Uuid) -> Result<Vec<InboxMessageRow>, AppError> {
        Ok(sqlx::query_as::<_, InboxMessageRow>(
            "SELECT * FROM inbox_messages WHERE practitioner_id = $1 ORDER BY created_at DESC",
        )
        .bind(practitioner_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn mark_inbox_read(
        &self,
        practitioner_id: Uuid,
        message_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<InboxMessageRow>, AppError> {
        Ok(sqlx::query_as::<_, InboxMessageRow>(
            r#"
            UPDATE inbox_messages
            SET read_at = COALESCE(read_at, $3)
            WHERE id = $1 AND practitioner_id = $2
            RETURNING *
            "#,
        )
        .bind(message_id)
        .bind(practitioner_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?)
    }
}
