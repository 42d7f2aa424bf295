use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::chat::quota::{monthly_usage, MonthlyUsage};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub usage: MonthlyUsage,
}

/// GET /api/v1/me
pub async fn handle_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let usage = monthly_usage(state.store.as_ref(), user.id, user.tier(), Utc::now()).await?;
    Ok(Json(MeResponse { user, usage }))
}
