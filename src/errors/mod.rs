/// Unified error handling module
use crate::domain::RecommendationStatus;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Failure of a recommendation provider. Never fatal: the fallback chain absorbs it.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no model endpoint configured")]
    NotConfigured,
    #[error("model endpoint transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    InvalidStateTransition {
        id: String,
        from: RecommendationStatus,
        to: RecommendationStatus,
    },
    AnalysisInProgress,
    Provider(ProviderError),
    ExternalApi(reqwest::Error),
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidStateTransition { id, from, to } => write!(
                f,
                "Recommendation {} cannot move from {} to {}",
                id, from, to
            ),
            ApiError::AnalysisInProgress => write!(f, "An analysis is already running"),
            ApiError::Provider(e) => write!(f, "Recommendation provider error: {}", e),
            ApiError::ExternalApi(e) => write!(f, "External API error: {}", e),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::ExternalApi(err)
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::Provider(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::InvalidStateTransition { .. } => {
                (StatusCode::CONFLICT, "INVALID_STATE_TRANSITION")
            }
            ApiError::AnalysisInProgress => (StatusCode::CONFLICT, "ANALYSIS_IN_PROGRESS"),
            ApiError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
            ApiError::ExternalApi(e) => {
                let code = match e.status().map(|s| s.as_u16()) {
                    Some(403) => "UPSTREAM_403",
                    Some(404) => "UPSTREAM_404",
                    Some(429) => "UPSTREAM_429",
                    Some(500..=599) => "UPSTREAM_5XX",
                    _ => "UPSTREAM_ERROR",
                };
                (StatusCode::BAD_GATEWAY, code)
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = ApiError::Validation("no trains selected".to_string());
        assert_eq!(
            err.status_and_code(),
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        );
        assert_eq!(err.to_string(), "Validation error: no trains selected");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = ApiError::InvalidStateTransition {
            id: "rec_1_0".to_string(),
            from: RecommendationStatus::Applied,
            to: RecommendationStatus::Rejected,
        };
        assert_eq!(
            err.to_string(),
            "Recommendation rec_1_0 cannot move from applied to rejected"
        );
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
    }

    #[test]
    fn test_response_envelope() {
        let response = ApiError::AnalysisInProgress.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
