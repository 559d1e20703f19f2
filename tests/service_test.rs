// SPDX-FileCopyrightText: 2026 Notorium Contributors
// SPDX-License-Identifier: Apache-2.0

//! Service-level tests for the in-path guard.
//!
//! Drives the `admit` handler through the router and asserts on the HTTP
//! surface: rate-limit headers on every response, 429 with Retry-After
//! when throttled, 422 for refused URLs, and the header-derived client
//! key partitioning quotas.

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    routing::post,
    Router,
};
use std::sync::Arc;
use tower::util::ServiceExt;

use notorium_ingress_guard::{
    config::{AdmissionConfig, RateLimitConfig},
    handlers::{admit, AppState},
    limiter::RateLimiter,
    metrics::IngressMetrics,
    validator::AudioUrlValidator,
};

fn guard_app(max_requests: u32) -> Router {
    let state = Arc::new(AppState {
        limiter: RateLimiter::new(RateLimitConfig {
            max_requests,
            window_secs: 60,
        }),
        validator: AudioUrlValidator::new(AdmissionConfig::default()),
        metrics: IngressMetrics::new().unwrap(),
    });

    Router::new()
        .route("/v1/transcriptions/admit", post(admit))
        .with_state(state)
}

fn admit_request(client: &str, audio_url: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/transcriptions/admit")
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(format!(r#"{{"audio_url":"{audio_url}"}}"#)))
        .unwrap()
}

fn header<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("{name} header missing"))
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_admitted_response_carries_rate_limit_headers() {
    let app = guard_app(10);

    let response = app
        .oneshot(admit_request(
            "203.0.113.7",
            "https://example.com/lecture.mp3",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "X-RateLimit-Limit"), "10");
    assert_eq!(header(&response, "X-RateLimit-Remaining"), "9");
    assert!(header(&response, "X-RateLimit-Reset").parse::<i64>().unwrap() > 0);
}

#[tokio::test]
async fn test_refused_url_gets_422_with_rate_limit_headers() {
    let app = guard_app(10);

    let response = app
        .oneshot(admit_request("203.0.113.7", "https://example.com/file.exe"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    // The refused request still consumed a slot and reports it
    assert_eq!(header(&response, "X-RateLimit-Limit"), "10");
    assert_eq!(header(&response, "X-RateLimit-Remaining"), "9");
    assert!(header(&response, "X-RateLimit-Reset").parse::<i64>().unwrap() > 0);
}

#[tokio::test]
async fn test_throttled_response_is_429_with_retry_after() {
    let app = guard_app(1);

    let first = app
        .clone()
        .oneshot(admit_request(
            "203.0.113.7",
            "https://example.com/lecture.mp3",
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(admit_request(
            "203.0.113.7",
            "https://example.com/lecture.mp3",
        ))
        .await
        .unwrap();

    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header(&second, "X-RateLimit-Limit"), "1");
    assert_eq!(header(&second, "X-RateLimit-Remaining"), "0");
    assert_eq!(
        header(&second, "X-RateLimit-Reset"),
        header(&first, "X-RateLimit-Reset"),
    );
    assert!(header(&second, "Retry-After").parse::<u64>().unwrap() <= 60);
}

#[tokio::test]
async fn test_forwarded_header_partitions_quota() {
    let app = guard_app(1);
    let audio_url = "https://example.com/lecture.mp3";

    // Client A uses up its window
    let response = app
        .clone()
        .oneshot(admit_request("203.0.113.1", audio_url))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(admit_request("203.0.113.1", audio_url))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Client B is unaffected
    let response = app
        .oneshot(admit_request("203.0.113.2", audio_url))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
