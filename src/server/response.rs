//! The JSON response envelope.
//!
//! Every endpoint answers with `{"success": true, "data": ..., "timestamp"}`
//! or `{"success": false, "error": ..., "timestamp"}` so clients can branch
//! on one field regardless of status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::error;

pub struct ApiResponse;

impl ApiResponse {
    pub fn ok<T: Serialize>(data: T) -> Response {
        Json(json!({
            "success": true,
            "data": data,
            "timestamp": timestamp(),
        }))
        .into_response()
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
        (
            status,
            Json(json!({
                "success": false,
                "error": message.into(),
                "timestamp": timestamp(),
            })),
        )
            .into_response()
    }

    pub fn not_found(what: &str) -> Response {
        Self::error(StatusCode::NOT_FOUND, format!("{} not found", what))
    }

    pub fn internal(err: anyhow::Error) -> Response {
        error!("Request failed: {:#}", err);
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let response = ApiResponse::ok(vec![1, 2, 3]);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_envelope_carries_status() {
        let response = ApiResponse::not_found("Artist");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
