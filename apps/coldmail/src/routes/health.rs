use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and portfolio readiness.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "coldmail",
        "portfolio_loaded": state.pipeline.store().is_loaded(),
        "portfolio_records": state.pipeline.store().record_count()
    }))
}
