use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use crate::{error::FocusLockError, policy::ToggleSelection, reconcile::with_deadline};

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicyRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub application_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BlockPolicyRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "toggleSelection")]
    pub toggles: ToggleSelection,
}

/// Malformed or mistyped bodies answer in the same JSON shape as other errors
fn request_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, FocusLockError> {
    payload
        .map(|Json(req)| req)
        .map_err(|rejection| FocusLockError::validation("request body", rejection.body_text()))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/create-access-policy", post(create_access_policy))
        .route("/create-block-policy", post(create_block_policy))
        .route("/healthz", get(health))
        .with_state(state)
}

/// POST /create-access-policy
async fn create_access_policy(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AccessPolicyRequest>, JsonRejection>,
) -> Response {
    let req = match request_body(payload) {
        Ok(req) => req,
        Err(err) => return err.into_response(),
    };
    let email = req.email.unwrap_or_default();
    let call = state
        .reconciler
        .upsert_access_policy(req.application_id.as_deref(), &email);

    match with_deadline(state.request_timeout, call).await {
        Ok(outcome) => Json(json!({
            "ok": true,
            "action": outcome.action,
            "policy": outcome.policy,
        }))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /create-block-policy
async fn create_block_policy(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BlockPolicyRequest>, JsonRejection>,
) -> Response {
    let req = match request_body(payload) {
        Ok(req) => req,
        Err(err) => return err.into_response(),
    };
    let call = state
        .reconciler
        .apply_block_policy(&req.toggles, req.email.as_deref());

    let report = match with_deadline(state.request_timeout, call).await {
        Ok(report) => report,
        Err(err) => return err.into_response(),
    };

    if report.is_complete() {
        return Json(json!({ "ok": true, "result": report })).into_response();
    }

    let status = if report.all_failed() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::MULTI_STATUS
    };
    let error = report
        .ensure_complete()
        .err()
        .map(|err| err.to_string())
        .unwrap_or_default();
    (
        status,
        Json(json!({ "ok": false, "error": error, "result": report })),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
