//! HTTP mapping of console errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cornerstone_core::Error;
use serde::Serialize;

/// Result type for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// A console error on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self(Error::Serialization(err))
    }
}

/// Error response body: `{"error": {"category", "message", "field"?}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Wrapped detail.
    pub error: ErrorDetail,
}

/// The detail inside [`ErrorBody`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Stable category, see [`Error::category`].
    pub category: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Offending field for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::AppDisabled { .. } => StatusCode::FORBIDDEN,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                category: self.0.category(),
                message: self.0.to_string(),
                field: self.0.field().map(str::to_string),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(category = self.0.category(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(category = self.0.category(), error = %self.0, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::not_found("vcts", "x"), StatusCode::NOT_FOUND),
            (Error::already_exists("vcts", "x"), StatusCode::CONFLICT),
            (Error::validation("bad"), StatusCode::UNPROCESSABLE_ENTITY),
            (
                Error::AppDisabled {
                    app: "credentials".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                Error::upstream("orbit", Some(503), "down"),
                StatusCode::BAD_GATEWAY,
            ),
            (Error::config("missing"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn test_body_carries_field() {
        let body = ApiError(Error::validation_field("name", "must not be empty")).body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"]["category"], "validation");
        assert_eq!(json["error"]["field"], "name");
    }

    #[test]
    fn test_body_omits_missing_field() {
        let body = ApiError(Error::not_found("vcts", "x")).body();
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["error"].get("field").is_none());
        assert_eq!(json["error"]["message"], "vcts not found: x");
    }
}
