use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use cusswatch_core::{AnalysisError, ClassifyError, ProviderError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

// Map the pipeline error taxonomy onto HTTP status classes: client error
// for bad input, not-found for supply-side emptiness, unprocessable for
// quality rejection, upstream-failure/timeout for the classification call.
impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let message = err.to_string();
        match err {
            AnalysisError::InvalidRequest(_) => Self::bad_request(message),
            AnalysisError::NoSubtitlesFound => Self::not_found(message),
            AnalysisError::NoUsableSubtitles { .. } => {
                Self::unprocessable(message)
            }
            AnalysisError::Classification(classify) => match classify {
                ClassifyError::Network(ref inner) if inner.is_timeout() => {
                    Self::gateway_timeout(message)
                }
                _ => Self::bad_gateway(message),
            },
        }
    }
}

// Catalog lookups surface provider errors directly.
impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        let message = err.to_string();
        match err {
            ProviderError::Api(_) => Self::internal(message),
            ProviderError::Network(ref inner) if inner.is_timeout() => {
                Self::gateway_timeout(message)
            }
            _ => Self::bad_gateway(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_errors_map_to_distinct_status_classes() {
        let bad: AppError =
            AnalysisError::InvalidRequest("missing tmdb_id".into()).into();
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let supply: AppError = AnalysisError::NoSubtitlesFound.into();
        assert_eq!(supply.status, StatusCode::NOT_FOUND);

        let quality: AppError =
            AnalysisError::NoUsableSubtitles { attempts: 5 }.into();
        assert_eq!(quality.status, StatusCode::UNPROCESSABLE_ENTITY);

        let upstream: AppError = AnalysisError::Classification(
            ClassifyError::Status(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .into();
        assert_eq!(upstream.status, StatusCode::BAD_GATEWAY);
    }
}
