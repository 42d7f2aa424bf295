use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InboxMessageRow {
    pub id: Uuid,
    pub practitioner_id: Uuid,
    pub sender_id: Uuid,
    pub member_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInboxMessage {
    pub practitioner_id: Uuid,
    pub sender_id: Uuid,
    pub member_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
}
