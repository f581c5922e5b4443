// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Delivery of contact messages through the EmailJS REST API.

use crate::config::{CredentialsConfig, DeliveryConfig};
use crate::validator::SanitizedRequest;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Delivery error types.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Missing delivery configuration: {0}")]
    MissingConfiguration(&'static str),

    #[error("Delivery transport failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Transport(err.to_string())
    }
}

/// Fully resolved EmailJS identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

impl Credentials {
    /// Resolve identifiers from configuration. Blank values count as missing.
    pub fn resolve(config: &CredentialsConfig) -> Result<Self, DeliveryError> {
        fn present(value: &Option<String>, name: &'static str) -> Result<String, DeliveryError> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(DeliveryError::MissingConfiguration(name))
        }

        Ok(Self {
            service_id: present(&config.service_id, "service_id")?,
            template_id: present(&config.template_id, "template_id")?,
            public_key: present(&config.public_key, "public_key")?,
        })
    }
}

/// Variables handed to the email template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParams {
    pub from_name: String,
    pub from_email: String,
    pub message: String,
    pub to_name: String,
    pub reply_to: String,
}

impl TemplateParams {
    pub fn new(request: &SanitizedRequest, recipient_name: &str) -> Self {
        Self {
            from_name: request.name.clone(),
            from_email: request.email.clone(),
            message: request.message.clone(),
            to_name: recipient_name.to_string(),
            reply_to: request.email.clone(),
        }
    }
}

/// Email dispatch service.
///
/// Implementations return the status code the service answered with. Whether
/// that code counts as success is the caller's decision.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send(
        &self,
        credentials: &Credentials,
        params: &TemplateParams,
    ) -> Result<u16, DeliveryError>;
}

#[async_trait]
impl<T: Delivery + ?Sized> Delivery for std::sync::Arc<T> {
    async fn send(
        &self,
        credentials: &Credentials,
        params: &TemplateParams,
    ) -> Result<u16, DeliveryError> {
        (**self).send(credentials, params).await
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a TemplateParams,
}

/// EmailJS API client
pub struct EmailJsClient {
    base_url: String,
    client: reqwest::Client,
}

impl EmailJsClient {
    /// Create a client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from delivery configuration, applying its timeout.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            base_url: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn send_url(&self) -> String {
        format!("{}/api/v1.0/email/send", self.base_url)
    }
}

#[async_trait]
impl Delivery for EmailJsClient {
    async fn send(
        &self,
        credentials: &Credentials,
        params: &TemplateParams,
    ) -> Result<u16, DeliveryError> {
        let body = SendRequest {
            service_id: &credentials.service_id,
            template_id: &credentials.template_id,
            user_id: &credentials.public_key,
            template_params: params,
        };

        let response = self.client.post(self.send_url()).json(&body).send().await?;
        let status = response.status().as_u16();
        debug!(status, "EmailJS responded");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials_config(service: Option<&str>, template: Option<&str>, key: Option<&str>) -> CredentialsConfig {
        CredentialsConfig {
            service_id: service.map(str::to_string),
            template_id: template.map(str::to_string),
            public_key: key.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_credentials() {
        let creds = Credentials::resolve(&credentials_config(
            Some("service_abc"),
            Some("template_xyz"),
            Some("pk_123"),
        ))
        .unwrap();
        assert_eq!(creds.service_id, "service_abc");
        assert_eq!(creds.public_key, "pk_123");
    }

    #[test]
    fn test_missing_or_blank_credentials() {
        let err = Credentials::resolve(&credentials_config(None, Some("t"), Some("k"))).unwrap_err();
        assert!(matches!(err, DeliveryError::MissingConfiguration("service_id")));

        let err = Credentials::resolve(&credentials_config(Some("s"), Some("  "), Some("k"))).unwrap_err();
        assert!(matches!(err, DeliveryError::MissingConfiguration("template_id")));

        let err = Credentials::resolve(&credentials_config(Some("s"), Some("t"), None)).unwrap_err();
        assert!(matches!(err, DeliveryError::MissingConfiguration("public_key")));
    }

    #[test]
    fn test_template_params_reply_to_sender() {
        let request = SanitizedRequest {
            name: "Jo Smith".to_string(),
            email: "jo@x.com".to_string(),
            message: "Hello there".to_string(),
        };
        let params = TemplateParams::new(&request, "Sumit Kharbuja");
        assert_eq!(params.reply_to, "jo@x.com");
        assert_eq!(params.to_name, "Sumit Kharbuja");
        assert_eq!(params.from_name, "Jo Smith");
    }

    #[test]
    fn test_send_request_wire_format() {
        let params = TemplateParams {
            from_name: "Jo".to_string(),
            from_email: "jo@x.com".to_string(),
            message: "Hello there".to_string(),
            to_name: "Sumit".to_string(),
            reply_to: "jo@x.com".to_string(),
        };
        let body = SendRequest {
            service_id: "s",
            template_id: "t",
            user_id: "k",
            template_params: &params,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["user_id"], "k");
        assert_eq!(json["template_params"]["reply_to"], "jo@x.com");
    }

    #[test]
    fn test_send_url_trims_trailing_slash() {
        let client = EmailJsClient::new("http://localhost:9000/");
        assert_eq!(client.send_url(), "http://localhost:9000/api/v1.0/email/send");
    }

    #[tokio::test]
    #[ignore] // Requires EmailJS credentials and network access
    async fn test_live_send() {
        let creds = Credentials::resolve(&crate::config::Config::from_env().delivery.credentials)
            .unwrap();
        let client = EmailJsClient::new("https://api.emailjs.com");
        let params = TemplateParams {
            from_name: "Test".to_string(),
            from_email: "test@example.com".to_string(),
            message: "Live delivery test".to_string(),
            to_name: "Test".to_string(),
            reply_to: "test@example.com".to_string(),
        };
        let status = client.send(&creds, &params).await.unwrap();
        assert_eq!(status, 200);
    }
}
