//! Shared API plumbing: the error type and request-body parsing.

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Parses a request body that handlers extract as raw JSON.
///
/// Handlers take `Json<Value>` and parse here so that schema mismatches
/// (missing `prompt`, wrong types) surface as a 400 `{error}` body
/// rather than the framework's default rejection.
pub fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_types::ChatRequest;
    use serde_json::json;

    #[test]
    fn missing_prompt_is_a_bad_request() {
        let err = parse_body::<ChatRequest>(json!({"temperature": 0.2})).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(err.to_string().contains("prompt"));
    }

    #[test]
    fn valid_body_parses() {
        let request: ChatRequest = parse_body(json!({"prompt": "hi"})).unwrap();
        assert_eq!(request.prompt, "hi");
    }
}
