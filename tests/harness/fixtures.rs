// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Shared configuration and request fixtures.

use contact_gate::config::{CredentialsConfig, DeliveryConfig};
use contact_gate::validator::ContactRequest;

pub const WINDOW_MS: i64 = 10 * 60 * 1000;

pub fn credentials() -> CredentialsConfig {
    CredentialsConfig {
        service_id: Some("service_test".to_string()),
        template_id: Some("template_test".to_string()),
        public_key: Some("public_test".to_string()),
    }
}

pub fn delivery_config() -> DeliveryConfig {
    DeliveryConfig::with_credentials(credentials())
}

pub fn valid_request() -> ContactRequest {
    ContactRequest::new(
        "Jo Smith",
        "jo@x.com",
        "Hello there, interested in collaborating!",
    )
}
