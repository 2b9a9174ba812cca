//! RPC error types.

use std::net::SocketAddr;

use axum::body::to_bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sigver_verification::{ErrorKind, ServiceError};
use thiserror::Error;
use tracing::{debug, error};

/// Failures starting or running the server.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(String),
}

/// A failed request, rendered as the JSON error envelope.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    /// Rejected before reaching a service, e.g. an unreadable body.
    Request { status: StatusCode, message: String },
}

impl ApiError {
    pub fn request(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Request {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(e) => status_for(e.kind()),
            ApiError::Request { status, .. } => *status,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::request(e.status(), e.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        ApiError::request(e.status(), e.body_text())
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Auth => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
        ErrorKind::Dependency | ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Service(e) => match e.kind() {
                ErrorKind::Dependency => {
                    error!(error = %e, "signature scorer failed");
                    "Signature verification service unavailable".to_string()
                }
                ErrorKind::Persistence => {
                    error!(error = %e, "request failed");
                    "Internal server error".to_string()
                }
                kind => {
                    debug!(error = ?e, ?kind, "request rejected");
                    e.to_string()
                }
            },
            ApiError::Request { message, .. } => {
                debug!(%status, message, "request rejected");
                message.clone()
            }
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

/// Largest plain-text error body carried over into the envelope.
const PLAIN_ERROR_BODY_LIMIT: usize = 16 * 1024;

/// Rewrap error responses produced outside the handlers (body limit, wrong
/// method) as the JSON envelope. JSON responses pass through.
pub async fn envelope_plain_errors(response: Response) -> Response {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !(status.is_client_error() || status.is_server_error()) || is_json {
        return response;
    }

    let body = to_bytes(response.into_body(), PLAIN_ERROR_BODY_LIMIT)
        .await
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&body).trim().to_string();
    let message = if text.is_empty() {
        status.canonical_reason().unwrap_or("Request failed").to_string()
    } else {
        text
    };
    ApiError::request(status, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigver_verification::ServiceError;

    #[test]
    fn statuses_follow_the_error_kind() {
        assert_eq!(
            ApiError::from(ServiceError::MissingCredential).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(ServiceError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(ServiceError::UserExists).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ServiceError::SignatureNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ServiceError::ReferenceFileMissing("r.png".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn plain_error_responses_get_the_envelope() {
        let plain = (StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded").into_response();
        let wrapped = envelope_plain_errors(plain).await;
        assert_eq!(wrapped.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = to_bytes(wrapped.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "length limit exceeded");
    }

    #[tokio::test]
    async fn empty_error_bodies_use_the_reason_phrase() {
        let wrapped = envelope_plain_errors(StatusCode::METHOD_NOT_ALLOWED.into_response()).await;
        let body = to_bytes(wrapped.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn successes_and_json_errors_pass_through() {
        let ok = envelope_plain_errors("fine".into_response()).await;
        let body = to_bytes(ok.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"fine");

        let json = ApiError::from(ServiceError::UserExists).into_response();
        let again = envelope_plain_errors(json).await;
        let body = to_bytes(again.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "User already exists");
    }
}
