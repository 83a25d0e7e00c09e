// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use carbon_tracker::config::Config;
use carbon_tracker::db::FirestoreDb;
use carbon_tracker::routes::create_router;
use carbon_tracker::services::{ChallengeService, TipService};
use carbon_tracker::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build shared state for tests around the given database. Tip generation
/// always runs without an API key so no test makes a network call.
#[allow(dead_code)]
pub fn test_state(db: FirestoreDb) -> Arc<AppState> {
    let config = Config::default();
    let challenge_service = ChallengeService::new(db.clone());
    let tip_service = TipService::new(None, config.tip_model.clone());

    Arc::new(AppState {
        config,
        db,
        challenge_service,
        tip_service,
    })
}

/// Create a test app with an offline mock database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state(test_db_offline());
    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state(test_db().await);
    (create_router(state.clone()), state)
}

/// Mint a session token for a test user, signed with the test config key.
#[allow(dead_code)]
pub fn test_jwt(username: &str) -> String {
    let config = Config::default();
    carbon_tracker::middleware::auth::create_jwt(username, &config.jwt_signing_key)
        .expect("Failed to create test JWT")
}
