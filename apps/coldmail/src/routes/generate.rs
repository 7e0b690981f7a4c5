//! Axum route handler for email generation.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::outreach::PipelineReport;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /generate (also served at /api/generate)
///
/// Scrapes the careers page at `url` and returns one cold email per job posting found.
/// 400 without a url, 422 when the page yields no text, 500 when the pipeline fails.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<PipelineReport>, AppError> {
    let url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("url is required".to_string()))?;

    let text = state.loader.load(url).await?;
    let report = state
        .pipeline
        .run_with_policy(&text, state.failure_policy)
        .await?;

    info!(
        url,
        emails = report.emails.len(),
        failures = report.failures.len(),
        "Generated emails"
    );
    Ok(Json(report))
}
