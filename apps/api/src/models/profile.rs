use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::triage::ProfileSummary;

/// Fields a client may change through `PATCH /api/v1/profile`.
/// Anything else in the request body is rejected, never applied.
pub const UPDATABLE_FIELDS: &[&str] = &[
    "constitution",
    "age_band",
    "conditions",
    "allergies",
    "medications",
    "preferred_domains",
    "notes",
];

const MAX_LIST_ITEMS: usize = 20;
const MAX_VALUE_CHARS: usize = 500;

/// Health profile of the account holder (`member_id = None`) or of one member.
/// `subject_id` is the member id, or the owner id for the account holder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HealthProfileRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub subject_id: Uuid,
    pub member_id: Option<Uuid>,
    pub constitution: Option<String>,
    pub age_band: Option<String>,
    pub conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
    pub preferred_domains: Vec<String>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl HealthProfileRow {
    pub fn empty(owner_id: Uuid, member_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            subject_id: member_id.unwrap_or(owner_id),
            member_id,
            constitution: None,
            age_band: None,
            conditions: vec![],
            allergies: vec![],
            medications: vec![],
            preferred_domains: vec![],
            notes: None,
            updated_at: Utc::now(),
        }
    }

    /// Applies the provided fields. An empty string clears a text field;
    /// an empty list clears a list field.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(v) = &update.constitution {
            self.constitution = clean_text(v);
        }
        if let Some(v) = &update.age_band {
            self.age_band = clean_text(v);
        }
        if let Some(v) = &update.conditions {
            self.conditions = clean_list(v);
        }
        if let Some(v) = &update.allergies {
            self.allergies = clean_list(v);
        }
        if let Some(v) = &update.medications {
            self.medications = clean_list(v);
        }
        if let Some(v) = &update.preferred_domains {
            self.preferred_domains = clean_list(v);
        }
        if let Some(v) = &update.notes {
            self.notes = clean_text(v);
        }
        self.updated_at = Utc::now();
    }

    /// Projection used for prompt assembly. Free-text notes are never sent.
    pub fn summary(&self, display_name: Option<String>) -> ProfileSummary {
        ProfileSummary {
            display_name,
            age_band: self.age_band.clone(),
            constitution: self.constitution.clone(),
            conditions: self.conditions.clone(),
            allergies: self.allergies.clone(),
            medications: self.medications.clone(),
            preferred_domains: self.preferred_domains.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub constitution: Option<String>,
    pub age_band: Option<String>,
    pub conditions: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
    pub preferred_domains: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl ProfileUpdate {
    /// Parses a PATCH body, rejecting keys outside [`UPDATABLE_FIELDS`] by name.
    pub fn from_json(value: Value) -> Result<Self, AppError> {
        let Value::Object(map) = value else {
            return Err(AppError::Validation(
                "Profile update must be a JSON object".to_string(),
            ));
        };

        let mut rejected: Vec<&str> = map
            .keys()
            .map(String::as_str)
            .filter(|k| !UPDATABLE_FIELDS.contains(k))
            .collect();
        if !rejected.is_empty() {
            rejected.sort_unstable();
            return Err(AppError::Validation(format!(
                "Fields cannot be updated: {}. Allowed: {}",
                rejected.join(", "),
                UPDATABLE_FIELDS.join(", ")
            )));
        }
        if map.is_empty() {
            return Err(AppError::Validation(
                "Profile update contains no fields".to_string(),
            ));
        }

        let update: ProfileUpdate = serde_json::from_value(Value::Object(map))
            .map_err(|e| AppError::Validation(format!("Invalid profile update: {e}")))?;
        update.check_sizes()?;
        Ok(update)
    }

    fn check_sizes(&self) -> Result<(), AppError> {
        let texts = [&self.constitution, &self.age_band, &self.notes];
        if texts
            .iter()
            .filter_map(|t| t.as_deref())
            .any(|t| t.chars().count() > MAX_VALUE_CHARS)
        {
            return Err(AppError::Validation(format!(
                "Profile values are limited to {MAX_VALUE_CHARS} characters"
            )));
        }

        let lists = [
            &self.conditions,
            &self.allergies,
            &self.medications,
            &self.preferred_domains,
        ];
        for list in lists.iter().filter_map(|l| l.as_ref()) {
            if list.len() > MAX_LIST_ITEMS {
                return Err(AppError::Validation(format!(
                    "Profile lists are limited to {MAX_LIST_ITEMS} items"
                )));
            }
            if list.iter().any(|v| v.chars().count() > MAX_VALUE_CHARS) {
                return Err(AppError::Validation(format!(
                    "Profile values are limited to {MAX_VALUE_CHARS} characters"
                )));
            }
        }
        Ok(())
    }
}

fn clean_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
