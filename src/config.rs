// SPDX-FileCopyrightText: 2026 Notorium Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the Notorium ingress guard.
//!
//! Defaults match the quota applied to the hosted transcription endpoints:
//! 10 requests per minute per client, standard audio container extensions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the ingress guard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Audio URL admission configuration
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Fixed-window rate limit applied per client key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window per client key (default: 10)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// Admission policy for caller-supplied audio URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// File extensions accepted for transcription, lowercase, no dot
    /// (default: mp3, wav, ogg, m4a, aac, webm)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Require the https scheme; set in production deployments (default: false)
    #[serde(default)]
    pub require_https: bool,

    /// Hosts whose URLs are admitted without further host policy.
    /// Subdomains of a listed host are trusted too.
    /// (default: firebasestorage.googleapis.com)
    #[serde(default = "default_trusted_hosts")]
    pub trusted_hosts: Vec<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

fn default_allowed_extensions() -> Vec<String> {
    ["mp3", "wav", "ogg", "m4a", "aac", "webm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_trusted_hosts() -> Vec<String> {
    vec!["firebasestorage.googleapis.com".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            admission: AdmissionConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            require_https: false,
            trusted_hosts: default_trusted_hosts(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}
