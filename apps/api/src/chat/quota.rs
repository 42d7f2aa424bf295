//! Monthly message quota: one count-and-compare per chat request.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::Tier;
use crate::store::Store;

/// Usage reported on `GET /api/v1/me`.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyUsage {
    pub tier: Tier,
    pub used: i64,
    /// `None` = unlimited.
    pub limit: Option<u32>,
    pub period_start: DateTime<Utc>,
}

/// First instant of the UTC calendar month containing `now`.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Rejects the request when `used` has reached the tier's monthly limit.
pub fn check_quota(tier: Tier, used: i64) -> Result<(), AppError> {
    match tier.monthly_limit() {
        Some(limit) if used >= i64::from(limit) => Err(AppError::QuotaExceeded { limit }),
        _ => Ok(()),
    }
}

pub async fn monthly_usage(
    store: &dyn Store,
    owner_id: Uuid,
    tier: Tier,
    now: DateTime<Utc>,
) -> Result<MonthlyUsage, AppError> {
    let period_start = month_start(now);
    let used = store.count_user_messages_since(owner_id, period_start).await?;
    Ok(MonthlyUsage {
        tier,
        used,
        limit: tier.monthly_limit(),
        period_start,
    })
}
