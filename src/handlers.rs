// SPDX-FileCopyrightText: 2026 Notorium Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP handlers for the ingress guard.
//!
//! The guard fronts the transcription endpoints: every request is counted
//! against the caller's rate window and its audio URL is checked before
//! anything is forwarded to the (billed) transcription backend.

use crate::limiter::{RateLimitDecision, RateLimiter};
use crate::metrics::IngressMetrics;
use crate::validator::{AdmissionResult, AudioUrlValidator};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub validator: AudioUrlValidator,
    pub metrics: IngressMetrics,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Admission request: the audio the caller wants transcribed.
#[derive(Debug, Deserialize)]
pub struct AdmitRequest {
    pub audio_url: String,
}

/// Admission response for an allowed request.
#[derive(Debug, Serialize)]
pub struct AdmitResponse {
    pub allowed: bool,
    pub remaining: u32,
}

/// Guard check request (external validation mode).
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub ip: String,
    pub audio_url: String,
}

/// Guard check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "notorium-ingress-guard",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}

/// Derive the rate-limit client key from request headers.
///
/// Precedence: first value of `x-forwarded-for`, then `x-real-ip`, then
/// the loopback default for direct local callers.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    "127.0.0.1".to_string()
}

/// Rate-limit headers attached to every guarded response.
fn rate_limit_headers(decision: &RateLimitDecision) -> [(&'static str, String); 3] {
    [
        ("X-RateLimit-Limit", decision.limit.to_string()),
        ("X-RateLimit-Remaining", decision.remaining.to_string()),
        ("X-RateLimit-Reset", decision.reset.timestamp().to_string()),
    ]
}

/// Seconds until the caller's window resets, for Retry-After.
fn retry_after_secs(decision: &RateLimitDecision) -> u64 {
    (decision.reset - Utc::now()).num_seconds().max(0) as u64
}

/// In-path guard for transcription requests.
///
/// Counts the request against the caller's window, then checks the audio
/// URL. `X-RateLimit-*` headers are set on every response; 429 when the
/// window is exhausted, 422 when the URL is refused.
pub async fn admit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AdmitRequest>,
) -> Response {
    state.metrics.requests_total.inc();

    let key = client_ip(&headers);
    debug!(key = %key, audio_url = %req.audio_url, "Processing admission request");

    let decision = state.limiter.check(&key).await;
    let limit_headers = rate_limit_headers(&decision);

    if !decision.success {
        state.metrics.throttled_total.inc();
        let retry_secs = retry_after_secs(&decision);
        info!(key = %key, retry_after_secs = retry_secs, "Request throttled");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            limit_headers,
            [("Retry-After", retry_secs.to_string())],
            Json(ErrorResponse {
                error: "Rate limit exceeded".to_string(),
                code: "RATE_LIMITED",
                retry_after_secs: Some(retry_secs),
            }),
        )
            .into_response();
    }

    if let AdmissionResult::Refused(err) = state.validator.validate(&req.audio_url) {
        state.metrics.refused_url_total.inc();
        info!(key = %key, error = %err, "Audio URL refused");
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            limit_headers,
            Json(ErrorResponse {
                error: err.to_string(),
                code: "INVALID_AUDIO_URL",
                retry_after_secs: None,
            }),
        )
            .into_response();
    }

    state.metrics.admitted_total.inc();
    debug!(key = %key, remaining = decision.remaining, "Request admitted");
    (
        StatusCode::OK,
        limit_headers,
        Json(AdmitResponse {
            allowed: true,
            remaining: decision.remaining,
        }),
    )
        .into_response()
}

/// Guard check for a fronting proxy (external validation mode).
///
/// Always returns 200 so the proxy can read the body; the URL is checked
/// first so malformed submissions do not consume the caller's quota.
pub async fn check(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckRequest>,
) -> impl IntoResponse {
    state.metrics.requests_total.inc();
    debug!(ip = %req.ip, audio_url = %req.audio_url, "Processing guard check");

    if let AdmissionResult::Refused(err) = state.validator.validate(&req.audio_url) {
        state.metrics.refused_url_total.inc();
        info!(ip = %req.ip, error = %err, "Audio URL refused");
        return (
            StatusCode::OK,
            Json(CheckResponse {
                allowed: false,
                reason: Some(err.to_string()),
                retry_after_secs: None,
                remaining: None,
            }),
        );
    }

    let decision = state.limiter.check(&req.ip).await;

    if decision.success {
        state.metrics.admitted_total.inc();
        debug!(ip = %req.ip, remaining = decision.remaining, "Request allowed");
        (
            StatusCode::OK,
            Json(CheckResponse {
                allowed: true,
                reason: None,
                retry_after_secs: None,
                remaining: Some(decision.remaining),
            }),
        )
    } else {
        state.metrics.throttled_total.inc();
        let retry_secs = retry_after_secs(&decision);
        info!(ip = %req.ip, retry_after_secs = retry_secs, "Request rate limited");
        (
            StatusCode::OK,
            Json(CheckResponse {
                allowed: false,
                reason: Some("Rate limit exceeded".to_string()),
                retry_after_secs: Some(retry_secs),
                remaining: None,
            }),
        )
    }
}
