use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversationRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Family member or client the conversation is about; `None` = the account holder.
    pub member_id: Option<Uuid>,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stored message. Turns are append-only; `seq` gives the total order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TurnRow {
    pub id: Uuid,
    pub seq: i64,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub tokens_used: Option<i32>,
    pub emergency_flag: bool,
    pub specialized_domain: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TurnRow {
    pub fn role(&self) -> Role {
        if self.role == "assistant" {
            Role::Assistant
        } else {
            Role::User
        }
    }
}

/// A turn to be appended; the store assigns id, seq and timestamp.
#[derive(Debug, Clone)]
pub struct NewTurn {
    pub role: Role,
    pub content: String,
    pub tokens_used: Option<i32>,
    pub emergency_flag: bool,
    pub specialized_domain: Option<String>,
}

impl NewTurn {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            tokens_used: None,
            emergency_flag: false,
            specialized_domain: None,
        }
    }
}
