// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed write endpoints.
//!
//! Each schema has a flat route (`{...fields, signature}`, as sent by the
//! web client) plus the generic `POST /contract/meta`. All of them end in
//! [`MetaTxGateway::execute`](crate::gateway::MetaTxGateway::execute) under
//! the ledger write lock.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::ApiError,
    gateway::{MetaTransactionRequest, OperationTag},
    models::{AccountAddress, ApiResponse, DomainResponse, NonceResponse, ReceiptResponse, TestData},
    state::AppState,
};

type ReceiptResult = Result<Json<ApiResponse<ReceiptResponse>>, ApiError>;

async fn submit(state: &AppState, request: MetaTransactionRequest) -> ReceiptResult {
    let submission = Uuid::new_v4();
    tracing::debug!(%submission, operation = %request.operation, "meta-transaction received");

    let receipt = {
        let mut ledger = state.ledger.write().await;
        state.gateway.execute(&mut ledger, request)
    }
    .inspect_err(|err| tracing::debug!(%submission, code = err.code(), "submission failed"))?;

    tracing::debug!(%submission, sequence = receipt.sequence, "submission applied");
    Ok(Json(ApiResponse::ok(receipt.into())))
}

async fn submit_flat(
    state: &AppState,
    operation: OperationTag,
    body: Result<Json<Value>, JsonRejection>,
) -> ReceiptResult {
    let Json(body) = body?;
    let request = MetaTransactionRequest::from_flat(operation, body)?;
    submit(state, request).await
}

#[utoipa::path(
    get,
    path = "/contract/test",
    tag = "Relay",
    responses((status = 200, body = ApiResponse<TestData>))
)]
pub async fn test() -> Json<ApiResponse<TestData>> {
    Json(ApiResponse::ok(TestData {
        value: "hi".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/contract/domain",
    tag = "Relay",
    responses((status = 200, body = ApiResponse<DomainResponse>))
)]
pub async fn domain(State(state): State<AppState>) -> Json<ApiResponse<DomainResponse>> {
    Json(ApiResponse::ok(DomainResponse::from(state.gateway.as_ref())))
}

#[utoipa::path(
    get,
    path = "/contract/nonce/{account}",
    params(("account" = String, Path, description = "Signer account")),
    tag = "Relay",
    responses(
        (status = 200, body = ApiResponse<NonceResponse>),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn nonce(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<ApiResponse<NonceResponse>>, ApiError> {
    let account = AccountAddress(account);
    let address = account.parse("account")?;
    let nonce = state.ledger.read().await.nonce_of(address);
    Ok(Json(ApiResponse::ok(NonceResponse {
        account: address.into(),
        nonce: nonce.to_string(),
    })))
}

#[utoipa::path(
    post,
    path = "/contract/meta",
    request_body = MetaTransactionRequest,
    tag = "Relay",
    responses(
        (status = 200, body = ApiResponse<ReceiptResponse>),
        (status = 400, description = "SCHEMA_MISMATCH"),
        (status = 401, description = "SIGNER_MISMATCH"),
        (status = 403, description = "UNAUTHORIZED_ACCESS"),
        (status = 404, description = "DEPENDENT_NOT_FOUND"),
        (status = 409, description = "NONCE_MISMATCH or DUPLICATE_IDENTITY")
    )
)]
pub async fn meta(
    State(state): State<AppState>,
    body: Result<Json<MetaTransactionRequest>, JsonRejection>,
) -> ReceiptResult {
    let Json(request) = body?;
    submit(&state, request).await
}

#[utoipa::path(
    post,
    path = "/contract/create",
    request_body(content = Object, description = "CreateChild fields plus `signature`"),
    tag = "Relay",
    responses((status = 200, body = ApiResponse<ReceiptResponse>))
)]
pub async fn create_child(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ReceiptResult {
    submit_flat(&state, OperationTag::CreateChild, body).await
}

#[utoipa::path(
    post,
    path = "/contract/connect",
    request_body(content = Object, description = "ConnectChild fields plus `signature`"),
    tag = "Relay",
    responses((status = 200, body = ApiResponse<ReceiptResponse>))
)]
pub async fn connect_child(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ReceiptResult {
    submit_flat(&state, OperationTag::ConnectChild, body).await
}

#[utoipa::path(
    post,
    path = "/contract/health/update",
    request_body(content = Object, description = "SetHealthInfo fields plus `signature`"),
    tag = "Relay",
    responses((status = 200, body = ApiResponse<ReceiptResponse>))
)]
pub async fn update_health(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ReceiptResult {
    submit_flat(&state, OperationTag::SetHealthInfo, body).await
}

#[utoipa::path(
    post,
    path = "/contract/medical/add",
    request_body(content = Object, description = "AddMedicalHistory fields plus `signature`"),
    tag = "Relay",
    responses((status = 200, body = ApiResponse<ReceiptResponse>))
)]
pub async fn add_medical_history(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ReceiptResult {
    submit_flat(&state, OperationTag::AddMedicalHistory, body).await
}

#[utoipa::path(
    post,
    path = "/contract/vaccination/update",
    request_body(content = Object, description = "UpdateVaccination fields plus `signature`"),
    tag = "Relay",
    responses((status = 200, body = ApiResponse<ReceiptResponse>))
)]
pub async fn update_vaccination(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ReceiptResult {
    submit_flat(&state, OperationTag::UpdateVaccination, body).await
}

#[utoipa::path(
    post,
    path = "/contract/vaccination/updateMulti",
    request_body(content = Object, description = "UpdateMultipleVaccination fields plus `signature`"),
    tag = "Relay",
    responses((status = 200, body = ApiResponse<ReceiptResponse>))
)]
pub async fn update_multiple_vaccination(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ReceiptResult {
    submit_flat(&state, OperationTag::UpdateMultipleVaccination, body).await
}
