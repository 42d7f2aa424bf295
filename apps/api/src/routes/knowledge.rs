use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;
use crate::triage::knowledge::DomainInfo;

#[derive(Debug, Serialize)]
pub struct DomainsResponse {
    /// Minimum keyword score a domain needs to be selected.
    pub min_score: u32,
    pub domains: Vec<DomainInfo>,
}

/// GET /api/v1/knowledge/domains
/// Lists the configured domain tags in tie-break order, with content status.
pub async fn domains_handler(State(state): State<AppState>) -> Json<DomainsResponse> {
    let router = state.pipeline.router();
    Json(DomainsResponse {
        min_score: router.min_score(),
        domains: router.domains(),
    })
}
