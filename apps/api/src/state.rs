use std::sync::Arc;

use crate::config::Config;
use crate::feedback::FeedbackClient;
use crate::proxy::upstream::Upstream;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything in here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Outbound seam for the proxy routes. `HttpUpstream` in production.
    pub upstream: Arc<dyn Upstream>,
    pub feedback: FeedbackClient,
}
