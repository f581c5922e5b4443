// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact gate service.
//!
//! Submissions are serialized behind one async mutex so the timestamp log's
//! read-modify-write never interleaves inside this process.

use crate::config::{Config, ConfigError};
use crate::delivery::Delivery;
use crate::metrics::SubmissionMetrics;
use crate::pipeline::{
    ContactForm, StatusView, SubmissionError, SubmissionPipeline, SubmissionStatus,
    GENERIC_FAILURE_MESSAGE,
};
use crate::store::TimestampStore;
use crate::validator::ContactRequest;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

/// Outcome label and status for request bodies that are not a contact form.
pub const MALFORMED_REQUEST: &str = "malformed_request";

/// Pipeline with type-erased store and delivery, as wired by the binary.
pub type SharedPipeline = SubmissionPipeline<Arc<dyn TimestampStore>, Arc<dyn Delivery>>;

/// Shared application state.
pub struct AppState {
    pub pipeline: Mutex<SharedPipeline>,
    pub metrics: SubmissionMetrics,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Contact submission response.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    #[serde(flatten)]
    pub view: StatusView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/contact", post(contact));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.with_state(state)
}

/// CORS policy: only `allowed_origin` when configured, otherwise any origin.
pub fn cors_layer(config: &Config) -> Result<CorsLayer, ConfigError> {
    let Some(origin) = &config.allowed_origin else {
        return Ok(CorsLayer::permissive());
    };

    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|_| ConfigError::InvalidOrigin(origin.clone()))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run one contact form submission.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Rejected malformed contact body");
            state.metrics.record_outcome(MALFORMED_REQUEST);
            return (
                rejection.status(),
                Json(ContactResponse {
                    view: StatusView {
                        status: MALFORMED_REQUEST,
                        message: GENERIC_FAILURE_MESSAGE,
                    },
                    retry_after_secs: None,
                }),
            )
                .into_response();
        }
    };

    debug!(
        name_len = request.name.len(),
        email_len = request.email.len(),
        message_len = request.message.len(),
        "Processing contact submission"
    );

    let mut form = ContactForm::new(request);
    let status = {
        let pipeline = state.pipeline.lock().await;
        pipeline.submit(&mut form).await
    };
    state.metrics.record(&status);

    let view = StatusView::from(&status);
    match &status {
        SubmissionStatus::Success => (
            StatusCode::OK,
            Json(ContactResponse {
                view,
                retry_after_secs: None,
            }),
        )
            .into_response(),
        SubmissionStatus::Error(SubmissionError::RateLimited { retry_after }) => {
            // Round up so clients never retry a moment too early.
            let retry_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(ContactResponse {
                    view,
                    retry_after_secs: Some(retry_secs),
                }),
            )
                .into_response()
        }
        SubmissionStatus::Error(SubmissionError::ValidationFailed(_)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ContactResponse {
                view,
                retry_after_secs: None,
            }),
        )
            .into_response(),
        SubmissionStatus::Error(_) => (
            StatusCode::BAD_GATEWAY,
            Json(ContactResponse {
                view,
                retry_after_secs: None,
            }),
        )
            .into_response(),
        SubmissionStatus::Idle | SubmissionStatus::Sending => {
            warn!(status = status.code(), "Submission finished without terminal status");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
