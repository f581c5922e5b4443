// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for submission outcomes.

use crate::pipeline::SubmissionStatus;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Submission outcome counters on a private registry.
#[derive(Clone)]
pub struct SubmissionMetrics {
    registry: Registry,
    submissions: IntCounterVec,
}

impl SubmissionMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_submissions_total",
                "Contact form submissions by terminal outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(submissions.clone()))?;

        Ok(Self {
            registry,
            submissions,
        })
    }

    /// Count one finished submission.
    pub fn record(&self, status: &SubmissionStatus) {
        self.record_outcome(status.code());
    }

    /// Count a request that ended before reaching the pipeline.
    pub fn record_outcome(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    pub fn count(&self, outcome: &str) -> u64 {
        self.submissions.with_label_values(&[outcome]).get()
    }

    /// Render the registry in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
