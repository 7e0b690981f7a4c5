use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::outreach::PipelineError;
use crate::scrape::ScrapeError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ScrapeError> for AppError {
    fn from(e: ScrapeError) -> Self {
        match e {
            ScrapeError::NoContent => AppError::UnprocessableEntity(e.to_string()),
            ScrapeError::Fetch { .. } | ScrapeError::Status { .. } => {
                tracing::warn!("Scrape failed: {e}");
                AppError::UnprocessableEntity(
                    "No content could be loaded from the URL.".to_string(),
                )
            }
            ScrapeError::Client(_) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Pipeline(e) => {
                let code = match e {
                    PipelineError::Store(_) => "PORTFOLIO_ERROR",
                    PipelineError::Extraction(_) => "EXTRACTION_ERROR",
                    PipelineError::Composition(c) => {
                        tracing::error!(role = c.role(), "Email composition aborted the run");
                        "COMPOSITION_ERROR"
                    }
                };
                tracing::error!("Unhandled error in generate endpoint: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, code, e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
