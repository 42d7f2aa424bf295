use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A family member or client managed by an account holder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MemberRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub name: String,
    /// e.g. "self", "child", "parent", "client"
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<String>,
}
