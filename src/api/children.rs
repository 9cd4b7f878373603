// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read endpoints. No signature: the requester is named in the query and
//! every dependent-scoped read is gated on guardianship.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::ApiError,
    models::{
        vaccination_response, AccountAddress, ApiResponse, DependentSummary, EventResponse,
        HealthRecordResponse, MedicalHistoryItem, VaccineResponse,
    },
    state::AppState,
};

#[derive(Deserialize, IntoParams)]
pub struct AccountQuery {
    /// Account whose dependents to list.
    pub account: AccountAddress,
}

/// The requester is taken at its word, like a read-only contract call: reads
/// are unauthenticated and gated only on the named account's guardianship.
#[derive(Deserialize, IntoParams)]
pub struct RequesterQuery {
    /// Account performing the read; must be a guardian.
    pub requester: AccountAddress,
}

fn now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

#[utoipa::path(
    get,
    path = "/contract/children",
    params(AccountQuery),
    tag = "Children",
    responses((status = 200, body = ApiResponse<Vec<DependentSummary>>))
)]
pub async fn list_children(
    State(state): State<AppState>,
    Query(params): Query<AccountQuery>,
) -> Result<Json<ApiResponse<Vec<DependentSummary>>>, ApiError> {
    let account = params.account.parse("account")?;
    let ledger = state.ledger.read().await;
    let now = now();
    let children = ledger
        .dependents_of(account)
        .into_iter()
        .map(|record| DependentSummary::new(record, now))
        .collect();
    Ok(Json(ApiResponse::ok(children)))
}

#[utoipa::path(
    get,
    path = "/contract/children/by-name/{name}",
    params(
        ("name" = String, Path, description = "Dependent name"),
        RequesterQuery
    ),
    tag = "Children",
    responses(
        (status = 200, body = ApiResponse<DependentSummary>),
        (status = 404, description = "No dependent with that name among the requester's")
    )
)]
pub async fn child_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<RequesterQuery>,
) -> Result<Json<ApiResponse<DependentSummary>>, ApiError> {
    let requester = params.requester.parse("requester")?;
    let ledger = state.ledger.read().await;
    let record = ledger.dependent_by_name(requester, &name)?;
    Ok(Json(ApiResponse::ok(DependentSummary::new(record, now()))))
}

#[utoipa::path(
    get,
    path = "/contract/children/{child_address}",
    params(
        ("child_address" = String, Path, description = "Dependent id"),
        RequesterQuery
    ),
    tag = "Children",
    responses(
        (status = 200, body = ApiResponse<DependentSummary>),
        (status = 403, description = "Requester is not a guardian"),
        (status = 404, description = "Unknown dependent")
    )
)]
pub async fn get_child(
    State(state): State<AppState>,
    Path(child_address): Path<String>,
    Query(params): Query<RequesterQuery>,
) -> Result<Json<ApiResponse<DependentSummary>>, ApiError> {
    let (requester, child) = parse_pair(&params, child_address)?;
    let ledger = state.ledger.read().await;
    let record = ledger.dependent(requester, child)?;
    Ok(Json(ApiResponse::ok(DependentSummary::new(record, now()))))
}

#[utoipa::path(
    get,
    path = "/contract/children/{child_address}/health",
    params(
        ("child_address" = String, Path, description = "Dependent id"),
        RequesterQuery
    ),
    tag = "Children",
    responses(
        (status = 200, body = ApiResponse<HealthRecordResponse>),
        (status = 403, description = "Requester is not a guardian"),
        (status = 404, description = "Unknown dependent")
    )
)]
pub async fn get_health(
    State(state): State<AppState>,
    Path(child_address): Path<String>,
    Query(params): Query<RequesterQuery>,
) -> Result<Json<ApiResponse<HealthRecordResponse>>, ApiError> {
    let (requester, child) = parse_pair(&params, child_address)?;
    let record = state.ledger.read().await.health(requester, child)?;
    Ok(Json(ApiResponse::ok(record.into())))
}

#[utoipa::path(
    get,
    path = "/contract/children/{child_address}/medical",
    params(
        ("child_address" = String, Path, description = "Dependent id"),
        RequesterQuery
    ),
    tag = "Children",
    responses(
        (status = 200, body = ApiResponse<Vec<MedicalHistoryItem>>),
        (status = 403, description = "Requester is not a guardian"),
        (status = 404, description = "Unknown dependent")
    )
)]
pub async fn get_medical_history(
    State(state): State<AppState>,
    Path(child_address): Path<String>,
    Query(params): Query<RequesterQuery>,
) -> Result<Json<ApiResponse<Vec<MedicalHistoryItem>>>, ApiError> {
    let (requester, child) = parse_pair(&params, child_address)?;
    let ledger = state.ledger.read().await;
    let items = ledger
        .medical_history(requester, child)?
        .iter()
        .enumerate()
        .map(|(index, entry)| MedicalHistoryItem::new(index, entry))
        .collect();
    Ok(Json(ApiResponse::ok(items)))
}

#[utoipa::path(
    get,
    path = "/contract/children/{child_address}/vaccination",
    params(
        ("child_address" = String, Path, description = "Dependent id"),
        RequesterQuery
    ),
    tag = "Children",
    responses(
        (status = 200, body = ApiResponse<Vec<VaccineResponse>>),
        (status = 403, description = "Requester is not a guardian"),
        (status = 404, description = "Unknown dependent")
    )
)]
pub async fn get_vaccination(
    State(state): State<AppState>,
    Path(child_address): Path<String>,
    Query(params): Query<RequesterQuery>,
) -> Result<Json<ApiResponse<Vec<VaccineResponse>>>, ApiError> {
    let (requester, child) = parse_pair(&params, child_address)?;
    let status = state.ledger.read().await.vaccination_status(requester, child)?;
    Ok(Json(ApiResponse::ok(vaccination_response(status))))
}

#[utoipa::path(
    get,
    path = "/contract/children/{child_address}/events",
    params(
        ("child_address" = String, Path, description = "Dependent id"),
        RequesterQuery
    ),
    tag = "Children",
    responses(
        (status = 200, body = ApiResponse<Vec<EventResponse>>),
        (status = 403, description = "Requester is not a guardian"),
        (status = 404, description = "Unknown dependent")
    )
)]
pub async fn get_events(
    State(state): State<AppState>,
    Path(child_address): Path<String>,
    Query(params): Query<RequesterQuery>,
) -> Result<Json<ApiResponse<Vec<EventResponse>>>, ApiError> {
    let (requester, child) = parse_pair(&params, child_address)?;
    let ledger = state.ledger.read().await;
    let events = ledger
        .events_for(requester, child)?
        .into_iter()
        .map(EventResponse::from)
        .collect();
    Ok(Json(ApiResponse::ok(events)))
}

fn parse_pair(
    params: &RequesterQuery,
    child_address: String,
) -> Result<(alloy::primitives::Address, alloy::primitives::Address), ApiError> {
    let requester = params.requester.parse("requester")?;
    let child = AccountAddress(child_address).parse("childAddress")?;
    Ok((requester, child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{HealthRecord, Ledger, MedicalHistoryEntry, Mutation, VaccinationUpdate};
    use alloy::primitives::Address;
    use axum::http::StatusCode;

    const PARENT: u8 = 0x01;
    const STRANGER: u8 = 0x09;

    fn seeded() -> (AppState, Address) {
        let mut ledger = Ledger::new();
        let parent = Address::repeat_byte(PARENT);
        let child = ledger
            .submit(
                parent,
                Mutation::CreateDependent {
                    name: "Kim".into(),
                    birth_date: 1_730_419_200,
                    health: HealthRecord::new(1201, 503),
                },
            )
            .unwrap()
            .dependent;
        ledger
            .submit(
                parent,
                Mutation::AddMedicalHistory {
                    dependent: child,
                    entry: MedicalHistoryEntry {
                        medical_type: 1,
                        visited_name: "Seoul Children's Clinic".into(),
                        timestamp: "2024-12-01T09:30:00Z".into(),
                        doctor_name: "Dr. Park".into(),
                        symptoms: "fever".into(),
                        diagnosis_details: "common cold".into(),
                    },
                },
            )
            .unwrap();
        ledger
            .submit(
                parent,
                Mutation::UpdateVaccination {
                    dependent: child,
                    update: VaccinationUpdate::new("DTap", 2, 1_728_518_400),
                },
            )
            .unwrap();

        let state = AppState::default();
        let seeded = AppState {
            ledger: std::sync::Arc::new(tokio::sync::RwLock::new(ledger)),
            ..state
        };
        (seeded, child)
    }

    fn requester(byte: u8) -> Query<RequesterQuery> {
        Query(RequesterQuery {
            requester: Address::repeat_byte(byte).into(),
        })
    }

    #[tokio::test]
    async fn guardian_reads_everything() {
        let (state, child) = seeded();
        let id = child.to_string();

        let Json(health) = get_health(State(state.clone()), Path(id.clone()), requester(PARENT))
            .await
            .unwrap();
        assert_eq!(health.data.height_display, "120.1");

        let Json(history) =
            get_medical_history(State(state.clone()), Path(id.clone()), requester(PARENT))
                .await
                .unwrap();
        assert_eq!(history.data.len(), 1);
        assert_eq!(history.data[0].doctor_name, "Dr. Park");

        let Json(vaccines) =
            get_vaccination(State(state.clone()), Path(id.clone()), requester(PARENT))
                .await
                .unwrap();
        assert_eq!(vaccines.data[0].chapter, 2);
        assert_eq!(vaccines.data[0].doses.len(), 2);

        let Json(events) = get_events(State(state.clone()), Path(id.clone()), requester(PARENT))
            .await
            .unwrap();
        assert_eq!(events.data.len(), 3);
        assert_eq!(events.data[2].event["event"], "VaccinationUpdated");

        let Json(summary) = get_child(State(state), Path(id), requester(PARENT))
            .await
            .unwrap();
        assert_eq!(summary.data.name, "Kim");
        assert_eq!(summary.data.guardians.len(), 1);
    }

    #[tokio::test]
    async fn stranger_is_forbidden() {
        let (state, child) = seeded();
        let id = child.to_string();

        let err = get_health(State(state.clone()), Path(id.clone()), requester(STRANGER))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, Some("UNAUTHORIZED_ACCESS"));

        let err = get_events(State(state), Path(id), requester(STRANGER))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_child_is_not_found() {
        let (state, _) = seeded();
        let err = get_vaccination(
            State(state),
            Path(Address::repeat_byte(0x77).to_string()),
            requester(PARENT),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lists_and_finds_by_name() {
        let (state, child) = seeded();

        let Json(list) = list_children(
            State(state.clone()),
            Query(AccountQuery {
                account: Address::repeat_byte(PARENT).into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].child_address, AccountAddress::from(child));

        let Json(found) = child_by_name(State(state.clone()), Path("Kim".into()), requester(PARENT))
            .await
            .unwrap();
        assert_eq!(found.data.child_address, AccountAddress::from(child));

        let err = child_by_name(State(state), Path("Kim".into()), requester(STRANGER))
            .await
            .unwrap_err();
        assert_eq!(err.code, Some("DEPENDENT_NOT_FOUND"));
    }

    #[tokio::test]
    async fn bad_address_is_bad_request() {
        let (state, _) = seeded();
        let err = get_health(State(state), Path("kim".into()), requester(PARENT))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
