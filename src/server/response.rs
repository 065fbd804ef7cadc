use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::FocusLockError;

impl FocusLockError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            _ if self.is_client_error() => StatusCode::BAD_REQUEST,
            FocusLockError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FocusLockError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        let body = json!({
            "ok": false,
            "error": self.to_string(),
            "details": self.details(),
        });
        (status, Json(body)).into_response()
    }
}
