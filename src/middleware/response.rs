use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Wrapper for API responses that automatically adds the success envelope:
/// `{ success: true, data?, message?, count? }`.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: Option<String>,
    pub count: Option<usize>,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            count: None,
            status_code: None, // Default to 200 OK
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            status_code: Some(StatusCode::CREATED),
            ..Self::success(data)
        }
    }

    /// Successful response carrying an explicit item count alongside a list
    pub fn with_count(data: T, count: usize) -> Self {
        Self {
            count: Some(count),
            ..Self::success(data)
        }
    }

    /// Data-less acknowledgement carrying only a message
    pub fn message(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            data: None,
            message: Some(message.into()),
            count: None,
            status_code: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let mut envelope = json!({ "success": true });
        let body = envelope.as_object_mut().unwrap();

        if let Some(data) = &self.data {
            match serde_json::to_value(data) {
                Ok(value) => {
                    body.insert("data".to_string(), value);
                }
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "success": false,
                            "message": "Failed to serialize response data"
                        })),
                    )
                        .into_response();
                }
            }
        }
        if let Some(message) = self.message {
            body.insert("message".to_string(), Value::String(message));
        }
        if let Some(count) = self.count {
            body.insert("count".to_string(), json!(count));
        }

        (status, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of<T: Serialize>(resp: ApiResponse<T>) -> (StatusCode, Value) {
        let status = resp.status_code.unwrap_or(StatusCode::OK);
        let mut envelope = json!({ "success": true });
        let map = envelope.as_object_mut().unwrap();
        if let Some(data) = &resp.data {
            map.insert("data".into(), serde_json::to_value(data).unwrap());
        }
        if let Some(message) = resp.message {
            map.insert("message".into(), Value::String(message));
        }
        if let Some(count) = resp.count {
            map.insert("count".into(), json!(count));
        }
        (status, envelope)
    }

    #[test]
    fn test_count_and_message_are_optional_envelope_fields() {
        let (status, body) = body_of(ApiResponse::with_count(vec![1, 2, 3], 3));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);
        assert_eq!(body["data"], json!([1, 2, 3]));

        let (_, body) = body_of(ApiResponse::<()>::message("done"));
        assert_eq!(body["message"], "done");
        assert!(body.get("data").is_none());
        assert!(body.get("count").is_none());
    }

    #[test]
    fn test_created_sets_201() {
        let (status, _) = body_of(ApiResponse::created(json!({"id": 1})));
        assert_eq!(status, StatusCode::CREATED);
    }
}
