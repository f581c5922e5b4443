// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact submission pipeline.
//!
//! A submit runs rate limiting, validation, credential resolution and delivery
//! in that order and leaves the form in a terminal status:
//!
//! ```text
//! Idle -> (Sending) -> Success | Error
//! Success | Error -> Idle   (on the next submit)
//! ```
//!
//! A rate-limited attempt stops before `Sending` and never reaches the
//! delivery service.

use crate::config::{CredentialsConfig, DeliveryConfig};
use crate::delivery::{Credentials, Delivery, DeliveryError, TemplateParams};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::store::TimestampStore;
use crate::validator::{ContactRequest, ContactValidator, ValidationError};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Message shown when the submission limit is hit.
pub const RATE_LIMITED_MESSAGE: &str =
    "Too many submissions. Please wait 10 minutes before trying again.";

/// Message shown for every other failure.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to send message. Please try again or contact me directly via email.";

/// Message shown after a successful delivery.
pub const SUCCESS_MESSAGE: &str = "Message sent successfully! I'll get back to you soon.";

/// Why a submission ended in [`SubmissionStatus::Error`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Rate limit exceeded, retry in {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Missing delivery configuration: {0}")]
    ConfigurationMissing(&'static str),

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Submission log unavailable: {0}")]
    Storage(String),
}

impl SubmissionError {
    /// Text shown to the person submitting the form.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => RATE_LIMITED_MESSAGE,
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }

    /// Stable label used in responses and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::ValidationFailed(_) => "validation_failed",
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::DeliveryFailed(_) => "delivery_failed",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl From<DeliveryError> for SubmissionError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::MissingConfiguration(field) => Self::ConfigurationMissing(field),
            DeliveryError::Transport(reason) => Self::DeliveryFailed(reason),
        }
    }
}

/// Form submission status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    /// Delivery in flight. Never the status of a finished submit.
    Sending,
    Success,
    Error(SubmissionError),
}

impl SubmissionStatus {
    pub fn is_sending(&self) -> bool {
        matches!(self, SubmissionStatus::Sending)
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Error(SubmissionError::RateLimited { .. })
        )
    }

    /// Stable label used in responses and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            SubmissionStatus::Idle => "idle",
            SubmissionStatus::Sending => "sending",
            SubmissionStatus::Success => "success",
            SubmissionStatus::Error(err) => err.code(),
        }
    }
}

/// Serializable summary of a status for HTTP responses.
#[derive(Debug, Serialize)]
pub struct StatusView {
    pub status: &'static str,
    pub message: &'static str,
}

impl From<&SubmissionStatus> for StatusView {
    fn from(status: &SubmissionStatus) -> Self {
        let message = match status {
            SubmissionStatus::Success => SUCCESS_MESSAGE,
            SubmissionStatus::Error(err) => err.user_message(),
            SubmissionStatus::Idle | SubmissionStatus::Sending => "",
        };
        Self {
            status: status.code(),
            message,
        }
    }
}

/// Form fields plus the status of the last submit.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub request: ContactRequest,
    status: SubmissionStatus,
}

impl ContactForm {
    pub fn new(request: ContactRequest) -> Self {
        Self {
            request,
            status: SubmissionStatus::Idle,
        }
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    pub fn is_sending(&self) -> bool {
        self.status.is_sending()
    }
}

/// Rate limiter, validator and delivery wired together.
pub struct SubmissionPipeline<S, D> {
    limiter: RateLimiter<S>,
    validator: ContactValidator,
    delivery: D,
    credentials: CredentialsConfig,
    recipient_name: String,
}

impl<S: TimestampStore, D: Delivery> SubmissionPipeline<S, D> {
    pub fn new(
        limiter: RateLimiter<S>,
        validator: ContactValidator,
        delivery: D,
        config: &DeliveryConfig,
    ) -> Self {
        Self {
            limiter,
            validator,
            delivery,
            credentials: config.credentials.clone(),
            recipient_name: config.recipient_name.clone(),
        }
    }

    pub fn limiter(&self) -> &RateLimiter<S> {
        &self.limiter
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Submit the form at the current wall-clock time.
    pub async fn submit(&self, form: &mut ContactForm) -> SubmissionStatus {
        self.submit_at(form, chrono::Utc::now().timestamp_millis()).await
    }

    /// Submit the form as if at `now` (Unix millis).
    pub async fn submit_at(&self, form: &mut ContactForm, now: i64) -> SubmissionStatus {
        form.status = SubmissionStatus::Idle;

        match self.limiter.check(now) {
            Ok(RateLimitResult::Allowed { remaining, .. }) => {
                debug!(remaining, "Submission passed rate limit");
            }
            Ok(RateLimitResult::Limited { retry_after }) => {
                info!(retry_after_secs = retry_after.as_secs(), "Submission rate limited");
                form.status = SubmissionStatus::Error(SubmissionError::RateLimited { retry_after });
                return form.status.clone();
            }
            Err(e) => {
                warn!(error = %e, "Rate limiter storage failed");
                form.status = SubmissionStatus::Error(SubmissionError::Storage(e.to_string()));
                return form.status.clone();
            }
        }

        form.status = SubmissionStatus::Sending;
        let outcome = self.deliver(&form.request).await;

        form.status = match outcome {
            Ok(()) => {
                form.request.clear();
                SubmissionStatus::Success
            }
            Err(err) => SubmissionStatus::Error(err),
        };
        form.status.clone()
    }

    async fn deliver(&self, request: &ContactRequest) -> Result<(), SubmissionError> {
        let sanitized = self.validator.validate(request).map_err(|e| {
            info!(error = %e, "Submission failed validation");
            SubmissionError::from(e)
        })?;

        let params = TemplateParams::new(&sanitized, &self.recipient_name);

        let credentials = Credentials::resolve(&self.credentials).map_err(|e| {
            warn!(error = %e, "Delivery configuration incomplete");
            SubmissionError::from(e)
        })?;

        let status = self
            .delivery
            .send(&credentials, &params)
            .await
            .map_err(|e| {
                warn!(error = %e, "Delivery request failed");
                SubmissionError::from(e)
            })?;

        if status != 200 {
            warn!(status, "Delivery service rejected message");
            return Err(SubmissionError::DeliveryFailed(format!(
                "unexpected status {status}"
            )));
        }

        info!(message_len = sanitized.message.chars().count(), "Contact message delivered");
        Ok(())
    }
}
