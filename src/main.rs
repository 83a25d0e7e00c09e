// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Carbon Tracker API Server
//!
//! Records lifestyle submissions, computes per-category emission estimates,
//! and runs reduction challenges and a leaderboard on top of Firestore.

use carbon_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{ChallengeService, TipService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Carbon Tracker API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Challenge catalog is compiled in; the service only needs the store
    let challenge_service = ChallengeService::new(db.clone());
    tracing::info!(
        count = challenge_service.catalog().all().len(),
        "Challenge catalog loaded"
    );

    // Tip generation degrades to canned tips without an API key
    let tip_service = TipService::new(config.anthropic_api_key.clone(), config.tip_model.clone());
    if config.anthropic_api_key.is_some() {
        tracing::info!(model = %config.tip_model, "Tip generation enabled");
    } else {
        tracing::info!("No tip API key configured, using canned tips");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        challenge_service,
        tip_service,
    });

    // Build router
    let app = carbon_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("carbon_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
