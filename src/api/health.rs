// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness response with a few ledger counters.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    /// Signing domain chain id.
    pub chain_id: u64,
    /// Gateway identity (`verifyingContract`).
    pub gateway: String,
    /// The relay's own account.
    pub relayer: String,
    /// Dependents created so far.
    pub dependents: usize,
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness(State(state): State<AppState>) -> Json<HealthResponse> {
    let dependents = state.ledger.read().await.dependent_count();
    Json(HealthResponse {
        status: "ok".to_string(),
        chain_id: state.gateway.config().chain_id,
        gateway: state.gateway.address().to_string(),
        relayer: state.relayer.to_string(),
        dependents,
    })
}
