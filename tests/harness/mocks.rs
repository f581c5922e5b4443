// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Delivery double that records every call.

use async_trait::async_trait;
use contact_gate::delivery::{Credentials, Delivery, DeliveryError, TemplateParams};
use std::sync::{Arc, Mutex};

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    TransportError(String),
}

/// Captures sent templates instead of reaching EmailJS.
#[derive(Clone)]
pub struct RecordingDelivery {
    calls: Arc<Mutex<Vec<(Credentials, TemplateParams)>>>,
    reply: Arc<Mutex<Reply>>,
}

impl RecordingDelivery {
    pub fn new(reply: Reply) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new(reply)),
        }
    }

    pub fn ok() -> Self {
        Self::new(Reply::Status(200))
    }

    /// Change the reply for subsequent calls.
    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(Credentials, TemplateParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send(
        &self,
        credentials: &Credentials,
        params: &TemplateParams,
    ) -> Result<u16, DeliveryError> {
        self.calls
            .lock()
            .unwrap()
            .push((credentials.clone(), params.clone()));

        match self.reply.lock().unwrap().clone() {
            Reply::Status(status) => Ok(status),
            Reply::TransportError(reason) => Err(DeliveryError::Transport(reason)),
        }
    }
}
