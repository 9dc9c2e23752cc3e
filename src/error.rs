use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generator::GenerateError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Validation(details) => ApiError::Validation(details),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "details": details }),
            ),
            ApiError::Internal(detail) => {
                // Detail stays in the logs, callers get a generic message.
                tracing::error!(error = %detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::ModelError;
    use crate::parser::ParseError;

    #[test]
    fn generate_errors_map_to_api_errors() {
        assert!(matches!(ApiError::from(GenerateError::Validation(vec!["x".into()])), ApiError::Validation(_)));
        assert!(matches!(ApiError::from(GenerateError::Parse(ParseError::NoIdeas)), ApiError::Internal(_)));
        assert!(matches!(ApiError::from(GenerateError::Model(ModelError::Other("boom".into()))), ApiError::Internal(_)));
    }

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(ApiError::BadRequest("bad".into()).into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Validation(vec![]).into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Internal("secret".into()).into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn internal_errors_hide_their_detail() {
        let response = ApiError::Internal("secret upstream key".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body, json!({ "error": "Internal server error" }));
        assert!(!String::from_utf8_lossy(&bytes).contains("secret"));
    }
}
