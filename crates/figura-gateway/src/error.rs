// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of [`FiguraError`] onto HTTP responses.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use figura_core::FiguraError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    /// Machine-readable category, see [`FiguraError::kind`].
    pub kind: &'static str,
}

/// Handler error wrapper rendering `{"error": ..., "kind": ...}`.
#[derive(Debug)]
pub struct ApiError(pub FiguraError);

impl From<FiguraError> for ApiError {
    fn from(err: FiguraError) -> Self {
        ApiError(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError(FiguraError::InvalidInput(format!(
            "malformed multipart body: {}",
            err.body_text()
        )))
    }
}

pub fn status_for(err: &FiguraError) -> StatusCode {
    match err {
        FiguraError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        FiguraError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        FiguraError::Forbidden(_) => StatusCode::FORBIDDEN,
        FiguraError::RecordNotFound { .. } | FiguraError::JobNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        FiguraError::Conflict(_) | FiguraError::Cancelled { .. } => StatusCode::CONFLICT,
        FiguraError::Submission { .. }
        | FiguraError::Generation { .. }
        | FiguraError::ServiceReported { .. } => StatusCode::BAD_GATEWAY,
        FiguraError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "request failed");
        } else {
            tracing::debug!(kind = self.0.kind(), error = %self.0, "request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                kind: self.0.kind(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn generation_failures_are_bad_gateway() {
        let err = FiguraError::ServiceReported {
            request_id: "r".into(),
            message: "invalid mesh topology".into(),
        };
        assert_eq!(status_for(&err), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&FiguraError::Generation {
                message: "no image generated".into(),
                source: None
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn client_errors() {
        assert_eq!(
            status_for(&FiguraError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&FiguraError::Forbidden("x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&FiguraError::RecordNotFound { id: 1 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&FiguraError::Conflict("x".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn timeout_and_internal() {
        let timeout = FiguraError::Timeout {
            request_id: "r".into(),
            attempts: 60,
            elapsed: Duration::from_secs(120),
        };
        assert_eq!(status_for(&timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(&FiguraError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_response_serializes() {
        let resp = ErrorResponse {
            error: "something went wrong".to_string(),
            kind: "internal",
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"error\":\"something went wrong\""));
        assert!(json.contains("\"kind\":\"internal\""));
    }
}
