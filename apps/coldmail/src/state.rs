use std::sync::Arc;

use crate::outreach::{FailurePolicy, Pipeline};
use crate::scrape::PageLoader;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub loader: Arc<PageLoader>,
    pub failure_policy: FailurePolicy,
}
