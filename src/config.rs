// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact submission gate.
//!
//! Defaults reproduce the behaviour of the portfolio contact form:
//! three submissions per ten minutes, EmailJS as the delivery service.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Storage key under which the submission timestamps are persisted.
pub const DEFAULT_STORAGE_KEY: &str = "emailSubmissions";

/// Configuration rejected at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Rate limit window must be positive, got {0} ms")]
    NonPositiveWindow(i64),

    #[error("Rate limit must admit at least one submission")]
    ZeroMaxSubmissions,

    #[error("Invalid allowed origin: {0}")]
    InvalidOrigin(String),
}

/// Configuration for the contact gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origin allowed to call the service from a browser. `None` allows any.
    #[serde(default)]
    pub allowed_origin: Option<String>,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Delivery configuration
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Sliding-window submission limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Length of the trailing window in milliseconds (default: 600000)
    #[serde(default = "default_window_ms")]
    pub window_ms: i64,

    /// Maximum admitted submissions inside the window (default: 3)
    #[serde(default = "default_max_submissions")]
    pub max_submissions: usize,

    /// Key the timestamp log is stored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// JSON file backing the timestamp log. In-memory when unset.
    #[serde(default)]
    pub store_path: Option<String>,
}

/// Field length bounds, counted in characters after trimming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_name_min")]
    pub name_min: usize,

    #[serde(default = "default_name_max")]
    pub name_max: usize,

    #[serde(default = "default_email_max")]
    pub email_max: usize,

    #[serde(default = "default_message_min")]
    pub message_min: usize,

    #[serde(default = "default_message_max")]
    pub message_max: usize,
}

/// EmailJS delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// EmailJS API base URL (default: https://api.emailjs.com)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Service, template and public key identifiers
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Name of the person receiving contact messages
    #[serde(default = "default_recipient_name")]
    pub recipient_name: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Delivery identifiers. Any of them may be absent; the pipeline fails the
/// submission rather than the process when one is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub service_id: Option<String>,

    #[serde(default)]
    pub template_id: Option<String>,

    #[serde(default)]
    pub public_key: Option<String>,
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

fn default_window_ms() -> i64 {
    10 * 60 * 1000
}

fn default_max_submissions() -> usize {
    3
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_name_min() -> usize {
    2
}

fn default_name_max() -> usize {
    50
}

fn default_email_max() -> usize {
    100
}

fn default_message_min() -> usize {
    10
}

fn default_message_max() -> usize {
    1000
}

fn default_api_base() -> String {
    "https://api.emailjs.com".to_string()
}

fn default_recipient_name() -> String {
    "Sumit Kharbuja".to_string()
}

fn default_timeout_secs() -> u64 {
    30
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
            allowed_origin: None,
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            delivery: DeliveryConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_submissions: default_max_submissions(),
            storage_key: default_storage_key(),
            store_path: None,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_min: default_name_min(),
            name_max: default_name_max(),
            email_max: default_email_max(),
            message_min: default_message_min(),
            message_max: default_message_max(),
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

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self::with_credentials(CredentialsConfig::default())
    }
}

impl DeliveryConfig {
    /// Build a delivery configuration with defaults and the given credentials.
    pub fn with_credentials(credentials: CredentialsConfig) -> Self {
        Self {
            api_base: default_api_base(),
            credentials,
            recipient_name: default_recipient_name(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Get the request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_ms.max(0) as u64)
    }

    /// A non-positive window admits everything; a zero maximum admits nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_ms <= 0 {
            return Err(ConfigError::NonPositiveWindow(self.window_ms));
        }
        if self.max_submissions == 0 {
            return Err(ConfigError::ZeroMaxSubmissions);
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value. Rate limit values that would disable the limit fall back to
    /// the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let parse = |name: &str| var(name).and_then(|v| v.trim().parse::<i64>().ok());

        let window_ms = match parse("RATE_LIMIT_WINDOW_MS") {
            Some(ms) if ms <= 0 => {
                warn!(window_ms = ms, "Ignoring non-positive RATE_LIMIT_WINDOW_MS");
                default_window_ms()
            }
            Some(ms) => ms,
            None => default_window_ms(),
        };
        let max_submissions = match parse("RATE_LIMIT_MAX") {
            Some(max) if max <= 0 => {
                warn!(max_submissions = max, "Ignoring non-positive RATE_LIMIT_MAX");
                default_max_submissions()
            }
            Some(max) => max as usize,
            None => default_max_submissions(),
        };

        let defaults = Self::default();
        Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            allowed_origin: var("ALLOWED_ORIGIN"),
            rate_limit: RateLimitConfig {
                window_ms,
                max_submissions,
                storage_key: var("STORAGE_KEY").unwrap_or_else(default_storage_key),
                store_path: var("STORE_PATH"),
            },
            validation: ValidationConfig::default(),
            delivery: DeliveryConfig {
                api_base: var("EMAILJS_API_BASE").unwrap_or_else(default_api_base),
                credentials: CredentialsConfig {
                    service_id: var("EMAILJS_SERVICE_ID")
                        .or_else(|| var("VITE_EMAILJS_SERVICE_ID")),
                    template_id: var("EMAILJS_TEMPLATE_ID")
                        .or_else(|| var("VITE_EMAILJS_TEMPLATE_ID")),
                    public_key: var("EMAILJS_PUBLIC_KEY")
                        .or_else(|| var("VITE_EMAILJS_PUBLIC_KEY")),
                },
                recipient_name: var("RECIPIENT_NAME").unwrap_or_else(default_recipient_name),
                timeout_secs: var("DELIVERY_TIMEOUT_SECS")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(default_timeout_secs()),
            },
            metrics: MetricsConfig {
                enabled: var("METRICS_ENABLED")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(true),
                ..defaults.metrics
            },
        }
    }

    /// Check values that would make the service misbehave silently.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limit.validate()
    }
}
