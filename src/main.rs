// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Gate Service
//!
//! Accepts contact form submissions from a static site, rate-limits and
//! validates them, then relays them to EmailJS.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is read
//! first if present):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `ALLOWED_ORIGIN`: Origin allowed for CORS (default: any)
//! - `RATE_LIMIT_WINDOW_MS`: Rate window in milliseconds (default: 600000)
//! - `RATE_LIMIT_MAX`: Submissions per window (default: 3)
//! - `STORE_PATH`: JSON file for the submission log (default: in-memory)
//! - `EMAILJS_SERVICE_ID`, `EMAILJS_TEMPLATE_ID`, `EMAILJS_PUBLIC_KEY`:
//!   delivery identifiers
//! - `RECIPIENT_NAME`: Name passed to the email template
//! - `METRICS_ENABLED`: Expose `/metrics` (default: true)

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_gate::{
    config::Config,
    delivery::{Credentials, Delivery, EmailJsClient},
    handlers::{cors_layer, router, AppState},
    limiter::RateLimiter,
    metrics::SubmissionMetrics,
    pipeline::SubmissionPipeline,
    store::{JsonFileStore, MemoryStore, TimestampStore},
    validator::ContactValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal in production.
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        bind_addr = %config.bind_addr,
        window_secs = config.rate_limit.window_duration().as_secs(),
        max_submissions = config.rate_limit.max_submissions,
        store_path = ?config.rate_limit.store_path,
        "Starting contact gate"
    );

    if let Err(e) = Credentials::resolve(&config.delivery.credentials) {
        // Submissions fail individually until this is fixed.
        warn!(error = %e, "Delivery credentials incomplete");
    }

    let store: Arc<dyn TimestampStore> = match &config.rate_limit.store_path {
        Some(path) => Arc::new(JsonFileStore::new(path, config.rate_limit.storage_key.clone())),
        None => Arc::new(MemoryStore::new()),
    };
    let delivery: Arc<dyn Delivery> = Arc::new(
        EmailJsClient::from_config(&config.delivery).context("building EmailJS client")?,
    );

    let pipeline = SubmissionPipeline::new(
        RateLimiter::new(config.rate_limit.clone(), store),
        ContactValidator::new(config.validation.clone()),
        delivery,
        &config.delivery,
    );

    let cors = cors_layer(&config).context("building CORS policy")?;

    let state = Arc::new(AppState {
        pipeline: Mutex::new(pipeline),
        metrics: SubmissionMetrics::new().context("registering metrics")?,
        config: config.clone(),
    });

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
