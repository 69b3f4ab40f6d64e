use crate::errors::{ApiError, ServiceError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use validator::Validate;

/// Wraps a JSON payload in the response envelope, setting the `success`
/// flag from the status class.
fn envelope(status: StatusCode, payload: Value) -> Response {
    let mut body = match payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    body.insert("success".to_string(), Value::Bool(status.is_success()));
    (status, Json(Value::Object(body))).into_response()
}

/// Standard success response
pub fn success_response(payload: Value) -> Response {
    envelope(StatusCode::OK, payload)
}

/// Standard created response
pub fn created_response(payload: Value) -> Response {
    envelope(StatusCode::CREATED, payload)
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_sets_success_flag() {
        let response = success_response(json!({"message": "ok"}));
        assert_eq!(response.status(), StatusCode::OK);

        let response = created_response(json!({"order": {}}));
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
