// SPDX-FileCopyrightText: 2026 Notorium Contributors
// SPDX-License-Identifier: Apache-2.0

//! Notorium Ingress Guard Service
//!
//! Fronts the transcription API with rate limiting and audio URL
//! admission. Two modes of operation:
//!
//! 1. **In-path guard**: requests hit `/v1/transcriptions/admit` before
//!    the handler dispatches work to the transcription backend; throttled
//!    callers get 429 with `Retry-After`.
//!
//! 2. **External validation**: a fronting proxy calls `/check` with the
//!    caller's IP and audio URL and reads the verdict from the body.
//!
//! ## Configuration
//!
//! Loaded from environment variables:
//!
//! - `BIND_ADDR`: server bind address (default: 0.0.0.0:8080)
//! - `RATE_LIMIT_MAX`: max requests per window per client (default: 10)
//! - `RATE_WINDOW_SECS`: window length in seconds (default: 60)
//! - `ALLOWED_EXTENSIONS`: comma-separated audio extensions
//! - `APP_ENV`: `production` enforces https on submitted URLs

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use notorium_ingress_guard::{
    config::Config,
    handlers::{admit, check, health, metrics, AppState},
    limiter::RateLimiter,
    metrics::IngressMetrics,
    validator::AudioUrlValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        require_https = config.admission.require_https,
        "Starting ingress guard"
    );

    // Create application state
    let limiter = RateLimiter::new(config.rate_limit.clone());
    let validator = AudioUrlValidator::new(config.admission.clone());
    let ingress_metrics = IngressMetrics::new()?;

    let state = Arc::new(AppState {
        limiter,
        validator,
        metrics: ingress_metrics,
    });

    // Spawn cleanup task
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup().await;
        }
    });

    // Build router
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/check", post(check))
        .route("/v1/transcriptions/admit", post(admit));

    if config.metrics.enabled {
        app = app.route(config.metrics.path.as_str(), get(metrics));
    }

    let app = app.layer(TraceLayer::new_for_http()).with_state(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    let mut config = Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        rate_limit: notorium_ingress_guard::config::RateLimitConfig {
            max_requests: std::env::var("RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            window_secs: std::env::var("RATE_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        },
        ..Default::default()
    };

    if let Ok(extensions) = std::env::var("ALLOWED_EXTENSIONS") {
        let extensions: Vec<String> = extensions
            .split(',')
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if !extensions.is_empty() {
            config.admission.allowed_extensions = extensions;
        }
    }

    config.admission.require_https = std::env::var("APP_ENV")
        .map(|env| env.eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    config
}
