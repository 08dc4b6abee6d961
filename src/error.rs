use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::MessageResponse;

/// Errors returned by the JSON API. Each renders as `{"message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    /// The public message is returned to the client; the cause is only logged.
    #[error("{message}: {cause}")]
    Internal {
        message: String,
        cause: anyhow::Error,
    },
}

impl ApiError {
    pub fn internal(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal {
            message: message.into(),
            cause: cause.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::NotFound(message) | ApiError::BadRequest(message) => message,
            ApiError::Internal { message, cause } => {
                error!("{}: {:#}", message, cause);
                message
            }
        };

        (status, Json(MessageResponse { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let response = ApiError::NotFound("Story not found".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "Story not found");
    }

    #[tokio::test]
    async fn test_internal_hides_cause() {
        let err = ApiError::internal("Failed to fetch stories", anyhow::anyhow!("disk on fire"));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Failed to fetch stories");
        assert!(!json.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_bad_request_status() {
        let err = ApiError::BadRequest("invalid".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
