// SPDX-FileCopyrightText: 2026 Notorium Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-window rate limiter for the transcription endpoints.
//!
//! One counter per client key over a configured window. This is a gate,
//! not a queue: refused requests are not buffered or retried here, the
//! HTTP layer surfaces 429 and the caller may retry after `reset`.
//!
//! Counters are process-local. Horizontally scaled deployments multiply
//! the effective limit by the instance count; that approximation is part
//! of the design.

use crate::config::RateLimitConfig;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::debug;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub success: bool,
    /// Configured maximum requests per window
    pub limit: u32,
    /// Requests left in the current window, 0 when refused
    pub remaining: u32,
    /// When the current window ends; stable across every check in a window
    pub reset: DateTime<Utc>,
}

/// Per-key window state.
#[derive(Debug)]
struct WindowEntry {
    /// Requests counted in the current window, saturating at the limit
    count: u32,
    /// Monotonic start of the window, drives expiry
    window_start: Instant,
    /// Wall-clock end of the window, reported to callers
    reset_at: DateTime<Utc>,
}

/// Thread-safe fixed-window rate limiter.
///
/// Constructed at startup and handed to request handlers through shared
/// state; tests get isolation by building their own instance.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<RwLock<HashMap<String, WindowEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check whether the client key may proceed, counting this call.
    ///
    /// The read-increment-write sequence runs under the write lock, so
    /// concurrent checks for the same key are serialized.
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let limit = self.config.max_requests;
        let window = self.config.window_duration();
        let mut windows = self.windows.write().await;

        let entry = windows.entry(key.to_string()).or_insert_with(|| WindowEntry {
            count: 0,
            window_start: Instant::now(),
            reset_at: Utc::now()
                + chrono::Duration::from_std(window).unwrap_or(chrono::Duration::zero()),
        });

        // Window elapsed? Start a fresh one with this call as its first.
        if entry.count > 0 && entry.window_start.elapsed() >= window {
            entry.count = 1;
            entry.window_start = Instant::now();
            entry.reset_at = Utc::now()
                + chrono::Duration::from_std(window).unwrap_or(chrono::Duration::zero());
            debug!(%key, "Window rolled over");
            return RateLimitDecision {
                success: true,
                limit,
                remaining: limit.saturating_sub(1),
                reset: entry.reset_at,
            };
        }

        if entry.count < limit {
            entry.count += 1;
            let remaining = limit - entry.count;
            debug!(%key, count = entry.count, remaining, "Request allowed");
            RateLimitDecision {
                success: true,
                limit,
                remaining,
                reset: entry.reset_at,
            }
        } else {
            // Count saturates at the limit; refused calls are not counted.
            debug!(%key, limit, "Rate limit exceeded");
            RateLimitDecision {
                success: false,
                limit,
                remaining: 0,
                reset: entry.reset_at,
            }
        }
    }

    /// Drop entries whose window has elapsed (called periodically).
    pub async fn cleanup(&self) {
        let window = self.config.window_duration();
        let mut windows = self.windows.write().await;
        windows.retain(|_, entry| entry.window_start.elapsed() < window);
    }

    /// Number of tracked client keys.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }
}
