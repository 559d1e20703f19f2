// SPDX-FileCopyrightText: 2026 Notorium Contributors
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics for the ingress guard.
//!
//! Counters live on a registry owned by the app state rather than the
//! global default registry, so each test or embedded instance gets its
//! own set.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Counters for admission decisions.
pub struct IngressMetrics {
    registry: Registry,
    /// Every request reaching the guard
    pub requests_total: IntCounter,
    /// Requests that passed both the limiter and the URL filter
    pub admitted_total: IntCounter,
    /// Requests refused by the rate limiter
    pub throttled_total: IntCounter,
    /// Requests refused by the audio URL filter
    pub refused_url_total: IntCounter,
}

impl IngressMetrics {
    /// Create the counter set on a fresh registry.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounter::new(
            "ingress_requests_total",
            "Total requests reaching the ingress guard",
        )?;
        let admitted_total = IntCounter::new(
            "ingress_admitted_total",
            "Requests admitted to the transcription backend",
        )?;
        let throttled_total = IntCounter::new(
            "ingress_throttled_total",
            "Requests refused by the rate limiter",
        )?;
        let refused_url_total = IntCounter::new(
            "ingress_refused_url_total",
            "Requests refused by the audio URL filter",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(admitted_total.clone()))?;
        registry.register(Box::new(throttled_total.clone()))?;
        registry.register(Box::new(refused_url_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            admitted_total,
            throttled_total,
            refused_url_total,
        })
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder
            .encode(&self.registry.gather(), &mut buffer)
            .is_err()
        {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
