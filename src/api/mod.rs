// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header::InvalidHeaderValue, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    gateway::{MetaTransactionRequest, OperationTag},
    models::{
        DependentSummary, DomainResponse, DoseResponse, EventResponse, HealthRecordResponse,
        MedicalHistoryItem, NonceResponse, ReceiptResponse, SchemaType, TestData,
        VaccineResponse,
    },
    state::AppState,
};

pub mod children;
pub mod health;
pub mod relay;

/// CORS layer admitting a single web origin.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(origin)?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let contract_routes = Router::new()
        .route("/test", get(relay::test))
        .route("/domain", get(relay::domain))
        .route("/nonce/{account}", get(relay::nonce))
        .route("/meta", post(relay::meta))
        .route("/create", post(relay::create_child))
        .route("/connect", post(relay::connect_child))
        .route("/health/update", post(relay::update_health))
        .route("/medical/add", post(relay::add_medical_history))
        .route("/vaccination/update", post(relay::update_vaccination))
        .route(
            "/vaccination/updateMulti",
            post(relay::update_multiple_vaccination),
        )
        .route("/children", get(children::list_children))
        .route("/children/by-name/{name}", get(children::child_by_name))
        .route("/children/{child_address}", get(children::get_child))
        .route("/children/{child_address}/health", get(children::get_health))
        .route(
            "/children/{child_address}/medical",
            get(children::get_medical_history),
        )
        .route(
            "/children/{child_address}/vaccination",
            get(children::get_vaccination),
        )
        .route("/children/{child_address}/events", get(children::get_events));

    Router::new()
        .nest("/contract", contract_routes)
        .route("/health/live", get(health::liveness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        relay::test,
        relay::domain,
        relay::nonce,
        relay::meta,
        relay::create_child,
        relay::connect_child,
        relay::update_health,
        relay::add_medical_history,
        relay::update_vaccination,
        relay::update_multiple_vaccination,
        children::list_children,
        children::child_by_name,
        children::get_child,
        children::get_health,
        children::get_medical_history,
        children::get_vaccination,
        children::get_events,
        health::liveness
    ),
    components(
        schemas(
            MetaTransactionRequest,
            OperationTag,
            ReceiptResponse,
            EventResponse,
            NonceResponse,
            DomainResponse,
            SchemaType,
            TestData,
            DependentSummary,
            HealthRecordResponse,
            MedicalHistoryItem,
            VaccineResponse,
            DoseResponse,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Relay", description = "Signed meta-transaction submission"),
        (name = "Children", description = "Guardian-gated dependent reads"),
        (name = "Health", description = "Service liveness")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::schema::CreateChild;
    use crate::gateway::MetaOperation;
    use alloy::primitives::U256;
    use alloy::signers::local::PrivateKeySigner;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        router(state, CorsLayer::permissive())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_route_says_hi() {
        let response = app(AppState::default())
            .oneshot(Request::get("/contract/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body, json!({"success": true, "data": {"value": "hi"}}));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = app(AppState::default())
            .oneshot(Request::get("/contract/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_then_read_through_router() {
        let state = AppState::default();
        let parent = PrivateKeySigner::from_slice(&[0x11; 32]).unwrap();
        let operation = MetaOperation::CreateChild(CreateChild {
            parent: parent.address(),
            name: "Kim".into(),
            birthDate: U256::from(1_730_419_200u64),
            height: 1201,
            weight: 503,
            nonce: U256::ZERO,
        });
        let mut body = operation.to_payload();
        body["signature"] = json!(state.gateway.sign(&parent, &operation).unwrap());

        let response = app(state.clone())
            .oneshot(post_json("/contract/create", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created = body_json(response).await;
        let child = created["data"]["childAddress"].as_str().unwrap().to_string();

        let uri = format!(
            "/contract/children/{child}/health?requester={}",
            parent.address()
        );
        let response = app(state.clone())
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health = body_json(response).await;
        assert_eq!(health["data"]["heightDisplay"], "120.1");

        let uri = format!("/contract/children/by-name/Kim?requester={}", parent.address());
        let response = app(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_body_uses_error_envelope() {
        let request = Request::builder()
            .method("POST")
            .uri("/contract/create")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app(AppState::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errorCode"], "SCHEMA_MISMATCH");
    }

    #[tokio::test]
    async fn liveness_is_mounted() {
        let response = app(AppState::default())
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn cors_rejects_invalid_origin() {
        assert!(cors_layer("http://localhost:3000").is_ok());
        assert!(cors_layer("bad\norigin").is_err());
    }
}
