mod config;
mod errors;
mod feedback;
mod proxy;
mod routes;
mod state;
mod trivia;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::feedback::FeedbackClient;
use crate::proxy::upstream::HttpUpstream;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Provider keys are optional; only malformed values stop startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview Prep API v{}", env!("CARGO_PKG_VERSION"));

    for settings in [&config.claude, &config.gemini] {
        if settings.api_key.is_none() {
            warn!(
                "{} is not set; its proxy route will answer 500",
                settings.key_var
            );
        }
    }

    let upstream = Arc::new(HttpUpstream::new()?);

    let feedback = FeedbackClient::from_config(&config)?;
    info!(
        "Feedback client initialized (provider: {}, model: {}, mode: {})",
        config.feedback.provider,
        feedback.model(),
        if feedback.is_live() { "live" } else { "fallback" }
    );

    let state = AppState {
        upstream,
        feedback,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS before exposing beyond localhost

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
