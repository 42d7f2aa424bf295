use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    /// "member" | "practitioner" | "admin"
    pub role: String,
    /// "free" | "plus" | "professional"
    pub tier: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_practitioner(&self) -> bool {
        self.role == "practitioner"
    }

    pub fn tier(&self) -> Tier {
        Tier::parse(&self.tier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Plus,
    Professional,
}

impl Tier {
    /// Unknown tier names fall back to the most restrictive tier.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "free" => Tier::Free,
            "plus" => Tier::Plus,
            "professional" => Tier::Professional,
            other => {
                warn!("Unknown subscription tier '{other}', treating as free");
                Tier::Free
            }
        }
    }

    /// User messages allowed per calendar month. `None` = unlimited.
    pub fn monthly_limit(&self) -> Option<u32> {
        match self {
            Tier::Free => Some(10),
            Tier::Plus => Some(300),
            Tier::Professional => None,
        }
    }
}

/// Practitioner as listed to members who want to send an inbox message.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PractitionerSummary {
    pub id: Uuid,
    pub display_name: Option<String>,
}
