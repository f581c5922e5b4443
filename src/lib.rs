// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Gate
//!
//! Submission gate for a portfolio contact form:
//!
//! - Sliding-window rate limiting (3 submissions per 10 minutes default)
//!   over a persisted timestamp log
//! - Field validation and minimal sanitization
//! - Delivery through the EmailJS REST API
//! - Explicit submission status state machine

pub mod config;
pub mod delivery;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod pipeline;
pub mod store;
pub mod validator;

pub use config::Config;
pub use delivery::{Delivery, EmailJsClient};
pub use limiter::{admit, RateLimitResult, RateLimiter};
pub use pipeline::{ContactForm, SubmissionError, SubmissionPipeline, SubmissionStatus};
pub use store::{JsonFileStore, MemoryStore, TimestampStore};
pub use validator::{ContactRequest, ContactValidator, ValidationError};
