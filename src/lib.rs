// SPDX-FileCopyrightText: 2026 Notorium Contributors
// SPDX-License-Identifier: Apache-2.0

//! Notorium Ingress Guard
//!
//! This crate guards the Notorium transcription endpoints, applying the
//! two decision rules that sit in front of every AI call:
//!
//! - Audio URL admission: absolute URL, allow-listed audio extension,
//!   https in production, trusted-storage carve-out
//! - Per-client fixed-window rate limiting with `X-RateLimit-*` reporting
//!
//! Both checks are pure, synchronous decisions over the request; refusals
//! are values, not errors, and nothing here calls out to the network.

pub mod config;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod validator;

pub use config::Config;
pub use limiter::{RateLimitDecision, RateLimiter};
pub use validator::{AdmissionResult, AudioUrlValidator};
