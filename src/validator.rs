// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Contact request validator and sanitizer.
//!
//! Rules are checked in the order name, email, message and the first failure
//! is returned. Sanitization only runs once every rule has passed.

use crate::config::ValidationConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("invalid email pattern"));

/// A contact request as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    /// Reset every field to empty.
    pub fn clear(&mut self) {
        self.name.clear();
        self.email.clear();
        self.message.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.message.is_empty()
    }
}

/// A request that passed validation, trimmed and stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name must be between {min} and {max} characters")]
    NameLength { min: usize, max: usize },

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Message must be between {min} and {max} characters")]
    MessageLength { min: usize, max: usize },
}

/// Contact request validator.
#[derive(Debug, Clone)]
pub struct ContactValidator {
    config: ValidationConfig,
}

impl Default for ContactValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl ContactValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate the sender name.
    pub fn validate_name(&self, name: &str) -> Result<(), ValidationError> {
        let len = name.trim().chars().count();
        if len < self.config.name_min || len > self.config.name_max {
            debug!(len, "Name length out of range");
            return Err(ValidationError::NameLength {
                min: self.config.name_min,
                max: self.config.name_max,
            });
        }
        Ok(())
    }

    /// Validate the reply address.
    pub fn validate_email(&self, email: &str) -> Result<(), ValidationError> {
        let email = email.trim();
        if email.chars().count() > self.config.email_max || !EMAIL_REGEX.is_match(email) {
            debug!(len = email.len(), "Email rejected");
            return Err(ValidationError::InvalidEmail);
        }
        Ok(())
    }

    /// Validate the message body.
    pub fn validate_message(&self, message: &str) -> Result<(), ValidationError> {
        let len = message.trim().chars().count();
        if len < self.config.message_min || len > self.config.message_max {
            debug!(len, "Message length out of range");
            return Err(ValidationError::MessageLength {
                min: self.config.message_min,
                max: self.config.message_max,
            });
        }
        Ok(())
    }

    /// Validate a complete request and return its sanitized form.
    pub fn validate(&self, request: &ContactRequest) -> Result<SanitizedRequest, ValidationError> {
        self.validate_name(&request.name)?;
        self.validate_email(&request.email)?;
        self.validate_message(&request.message)?;
        Ok(sanitize(request))
    }
}

/// Trim all fields, strip angle brackets from free text, lower-case the email.
///
/// This is not HTML escaping; it only removes `<` and `>`.
pub fn sanitize(request: &ContactRequest) -> SanitizedRequest {
    SanitizedRequest {
        name: strip_angle_brackets(request.name.trim()),
        email: request.email.trim().to_lowercase(),
        message: strip_angle_brackets(request.message.trim()),
    }
}

fn strip_angle_brackets(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '<' | '>')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_validator() -> ContactValidator {
        ContactValidator::default()
    }

    fn request(name: &str, email: &str, message: &str) -> ContactRequest {
        ContactRequest::new(name, email, message)
    }

    const MESSAGE: &str = "Hello there, interested in collaborating!";

    #[test]
    fn test_valid_request() {
        let sanitized = default_validator()
            .validate(&request("Jo Smith", "jo@x.com", MESSAGE))
            .unwrap();
        assert_eq!(sanitized.name, "Jo Smith");
        assert_eq!(sanitized.email, "jo@x.com");
        assert_eq!(sanitized.message, MESSAGE);
    }

    #[test]
    fn test_name_bounds() {
        let validator = default_validator();

        assert!(validator.validate_name("J").is_err());
        assert!(validator.validate_name("Jo").is_ok());
        assert!(validator.validate_name(&"a".repeat(50)).is_ok());
        assert!(validator.validate_name(&"a".repeat(51)).is_err());

        // Length is measured after trimming.
        assert!(validator.validate_name("  J  ").is_err());
        assert!(validator.validate_name("   ").is_err());
    }

    #[test]
    fn test_message_bounds() {
        let validator = default_validator();

        assert!(validator.validate_message(&"m".repeat(9)).is_err());
        assert!(validator.validate_message(&"m".repeat(10)).is_ok());
        assert!(validator.validate_message(&"m".repeat(1000)).is_ok());
        assert!(validator.validate_message(&"m".repeat(1001)).is_err());
    }

    #[test]
    fn test_email_shape() {
        let validator = default_validator();

        assert!(validator.validate_email("jo@x.com").is_ok());
        assert!(validator.validate_email("  Jo@X.com  ").is_ok());
        assert!(validator.validate_email("jo.x.com").is_err());
        assert!(validator.validate_email("jo@localhost").is_err());
        assert!(validator.validate_email("jo smith@x.com").is_err());
        assert!(validator.validate_email("jo@@x.com").is_err());
        assert!(validator.validate_email("").is_err());
    }

    #[test]
    fn test_email_length_limit() {
        let validator = default_validator();
        let local = "a".repeat(94);
        assert!(validator.validate_email(&format!("{local}@x.com")).is_ok());
        assert!(validator.validate_email(&format!("{local}a@x.com")).is_err());
    }

    #[test]
    fn test_first_failure_wins() {
        let result = default_validator().validate(&request("J", "not-an-email", "short"));
        assert_eq!(
            result.unwrap_err(),
            ValidationError::NameLength { min: 2, max: 50 }
        );

        let result = default_validator().validate(&request("Jo", "not-an-email", "short"));
        assert_eq!(result.unwrap_err(), ValidationError::InvalidEmail);

        let result = default_validator().validate(&request("Jo", "jo@x.com", "short"));
        assert!(matches!(
            result.unwrap_err(),
            ValidationError::MessageLength { .. }
        ));
    }

    #[test]
    fn test_sanitize_strips_angle_brackets() {
        let sanitized = default_validator()
            .validate(&request("<script>Bob", " JO@X.COM ", "  <b>Hello</b> there, friend  "))
            .unwrap();
        assert_eq!(sanitized.name, "scriptBob");
        assert_eq!(sanitized.email, "jo@x.com");
        assert_eq!(sanitized.message, "bHello/b there, friend");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::NameLength { min: 2, max: 50 }.to_string(),
            "Name must be between 2 and 50 characters"
        );
        assert_eq!(
            ValidationError::InvalidEmail.to_string(),
            "Please enter a valid email address"
        );
        assert_eq!(
            ValidationError::MessageLength { min: 10, max: 1000 }.to_string(),
            "Message must be between 10 and 1000 characters"
        );
    }
}
