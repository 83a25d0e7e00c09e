// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Integration tests for user deletion.
//!
//! These tests require the Firestore emulator to be running.
//! Run with: ./scripts/test-with-emulator.sh --test user_deletion_tests

use carbon_tracker::db::firestore::new_footprint_doc_id;
use carbon_tracker::db::FirestoreDb;
use carbon_tracker::models::challenge::{Enrollment, EnrollmentStatus, ProgressEntry};
use carbon_tracker::models::{FootprintRecord, FuelType, MealType, User, WasteType};

/// Check if emulator is available via environment variable.
fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
macro_rules! require_emulator {
    () => {
        if !emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            eprintln!("   Run with: ./scripts/test-with-emulator.sh");
            return;
        }
    };
}

/// Create a test database connection.
async fn test_db() -> FirestoreDb {
    let project_id = "test-project";
    FirestoreDb::new(project_id).await.unwrap()
}

/// Generate a unique username for test isolation.
fn unique_username() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let start = SystemTime::now();
    let since_the_epoch = start.duration_since(UNIX_EPOCH).unwrap();
    format!("del_{}", since_the_epoch.as_nanos())
}

fn footprint(owner: &str, created_at: chrono::DateTime<chrono::Utc>) -> FootprintRecord {
    FootprintRecord {
        record_id: new_footprint_doc_id(owner, created_at).unwrap(),
        owner: owner.to_string(),
        car_travel_km: 12.0,
        fuel_type: FuelType::Petrol,
        flights_hours: 0.0,
        public_transport_km: 0.0,
        meals_per_day: 3,
        meal_type: MealType::Medium,
        electricity_kwh: 5.0,
        waste_kg: 0.5,
        waste_type: WasteType::Medium,
        created_at: carbon_tracker::time_utils::format_utc_rfc3339(created_at),
        total_emission: 112.56,
    }
}

#[tokio::test]
async fn test_delete_user_data_removes_all_records() {
    require_emulator!();
    let db = test_db().await;
    let username = unique_username();
    let now = chrono::Utc::now();
    let now_str = carbon_tracker::time_utils::format_utc_rfc3339(now);

    // 1. Create User
    let user = User {
        username: username.clone(),
        email: "delete.me@example.com".to_string(),
        password_hash: "100000$de$ad".to_string(),
        created_at: now_str.clone(),
        last_active: now_str.clone(),
    };
    db.upsert_user(&user).await.unwrap();

    // 2. Create two footprint records
    db.batch_set_footprints(&[
        footprint(&username, now - chrono::Duration::hours(1)),
        footprint(&username, now),
    ])
    .await
    .unwrap();

    // 3. Create an enrollment
    let enrollment = Enrollment {
        user: username.clone(),
        challenge_id: "meatless-mondays".to_string(),
        status: EnrollmentStatus::Active,
        start_date: now_str.clone(),
        end_date: None,
        progress_percentage: 28,
        notes: String::new(),
        created_at: now_str.clone(),
        updated_at: now_str.clone(),
    };
    db.upsert_enrollment(&enrollment).await.unwrap();

    // 4. Create two check-in entries
    for date in ["2026-02-02", "2026-02-03"] {
        let entry = ProgressEntry {
            user: username.clone(),
            challenge_id: "meatless-mondays".to_string(),
            date: date.to_string(),
            completed: true,
            notes: "no meat today".to_string(),
            carbon_saved: Some(2.5),
            created_at: now_str.clone(),
        };
        db.upsert_progress_entry(&entry).await.unwrap();
    }

    // Verify everything exists before deletion
    assert!(db.get_user(&username).await.unwrap().is_some());
    assert_eq!(
        db.get_all_footprints_for_user(&username)
            .await
            .unwrap()
            .len(),
        2
    );
    assert!(db
        .get_enrollment(&username, "meatless-mondays")
        .await
        .unwrap()
        .is_some());
    assert_eq!(
        db.get_progress_entries(&username, "meatless-mondays")
            .await
            .unwrap()
            .len(),
        2
    );

    // 5. Execute Deletion
    // 2 check-ins + 1 enrollment + 2 footprints + 1 user document
    let count = db.delete_user_data(&username).await.unwrap();
    assert_eq!(count, 6);

    // Verify Everything is GONE
    assert!(db.get_user(&username).await.unwrap().is_none());
    assert!(db
        .get_all_footprints_for_user(&username)
        .await
        .unwrap()
        .is_empty());
    assert!(db
        .get_enrollment(&username, "meatless-mondays")
        .await
        .unwrap()
        .is_none());
    assert!(db
        .get_progress_entries(&username, "meatless-mondays")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_user_with_no_data_removes_only_profile() {
    require_emulator!();
    let db = test_db().await;
    let username = unique_username();
    let now_str = carbon_tracker::time_utils::format_utc_rfc3339(chrono::Utc::now());

    let user = User {
        username: username.clone(),
        email: "empty@example.com".to_string(),
        password_hash: "100000$be$ef".to_string(),
        created_at: now_str.clone(),
        last_active: now_str,
    };
    db.upsert_user(&user).await.unwrap();

    let count = db.delete_user_data(&username).await.unwrap();
    assert_eq!(count, 1, "only the user document should be deleted");
    assert!(db.get_user(&username).await.unwrap().is_none());
}
