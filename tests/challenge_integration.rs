// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge enrollment and progress integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with: ./scripts/test-with-emulator.sh

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use carbon_tracker::models::EnrollmentStatus;
use carbon_tracker::services::challenges::{CheckInInput, JoinOutcome};
use carbon_tracker::time_utils::parse_utc_rfc3339;
use tower::ServiceExt;

mod common;

/// Generate a unique username for test isolation.
fn unique_username(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}_{}", prefix, nanos)
}

#[tokio::test]
async fn test_join_then_duplicate_join() {
    require_emulator!();

    let state = common::test_state(common::test_db().await);
    let username = unique_username("join_user");

    // First join creates an active enrollment
    let outcome = state
        .challenge_service
        .join(&username, "meatless-mondays")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        JoinOutcome::Joined {
            title: "Meatless Mondays".to_string()
        }
    );

    let enrollment = state
        .db
        .get_enrollment(&username, "meatless-mondays")
        .await
        .unwrap()
        .expect("enrollment should exist after join");
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert_eq!(enrollment.progress_percentage, 0);
    assert!(enrollment.end_date.is_some(), "timed challenge has a window");

    // Joining again while active is reported, not duplicated
    let again = state
        .challenge_service
        .join(&username, "meatless-mondays")
        .await
        .unwrap();
    assert_eq!(again, JoinOutcome::AlreadyActive);

    println!("✓ Join and duplicate join verified: username={}", username);
}

#[tokio::test]
async fn test_join_unknown_challenge_fails() {
    require_emulator!();

    let state = common::test_state(common::test_db().await);
    let username = unique_username("join_unknown");

    let err = state
        .challenge_service
        .join(&username, "no-such-challenge")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        carbon_tracker::error::AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_rearm_after_failed_resets_window() {
    require_emulator!();

    let state = common::test_state(common::test_db().await);
    let username = unique_username("rearm_user");

    state
        .challenge_service
        .join(&username, "plastic-free-week")
        .await
        .unwrap();

    // Simulate a failed run with a window in the past
    let mut enrollment = state
        .db
        .get_enrollment(&username, "plastic-free-week")
        .await
        .unwrap()
        .unwrap();
    enrollment.status = EnrollmentStatus::Failed;
    enrollment.start_date = "2026-01-01T00:00:00.000Z".to_string();
    enrollment.end_date = Some("2026-01-08T00:00:00.000Z".to_string());
    enrollment.progress_percentage = 40;
    state.db.upsert_enrollment(&enrollment).await.unwrap();

    // Joining again re-arms the same enrollment document
    let outcome = state
        .challenge_service
        .join(&username, "plastic-free-week")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        JoinOutcome::Rearmed {
            title: "Plastic Free Week".to_string()
        }
    );

    let rearmed = state
        .db
        .get_enrollment(&username, "plastic-free-week")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rearmed.status, EnrollmentStatus::Active);
    assert_eq!(rearmed.progress_percentage, 0);

    // The window is recomputed from the new start, not carried over
    let end = parse_utc_rfc3339(rearmed.end_date.as_deref().unwrap()).unwrap();
    assert!(
        end > chrono::Utc::now(),
        "re-armed end date should be in the future"
    );

    println!("✓ Re-arm verified: username={}", username);
}

#[tokio::test]
async fn test_check_in_same_day_updates_in_place() {
    require_emulator!();

    let state = common::test_state(common::test_db().await);
    let username = unique_username("checkin_user");

    state
        .challenge_service
        .join(&username, "meatless-mondays")
        .await
        .unwrap();

    // First check-in counts one completed day out of seven
    let first = state
        .challenge_service
        .check_in(
            &username,
            "meatless-mondays",
            &CheckInInput {
                completed: true,
                notes: "veggie curry".to_string(),
                carbon_saved: Some(2.5),
            },
        )
        .await
        .unwrap();
    assert_eq!(first.status, EnrollmentStatus::Active);
    assert_eq!(first.progress_percentage, 14, "1 of 7 days rounds to 14%");

    // Re-submitting the same day replaces the entry instead of adding one
    let second = state
        .challenge_service
        .check_in(
            &username,
            "meatless-mondays",
            &CheckInInput {
                completed: false,
                notes: String::new(),
                carbon_saved: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(second.progress_percentage, 0, "same-day update overwrites");

    let entries = state
        .db
        .get_progress_entries(&username, "meatless-mondays")
        .await
        .unwrap();
    assert_eq!(entries.len(), 1, "one entry per (enrollment, date)");
    assert!(!entries[0].completed);

    println!("✓ Same-day check-in verified: username={}", username);
}

#[tokio::test]
async fn test_check_in_without_enrollment_fails() {
    require_emulator!();

    let state = common::test_state(common::test_db().await);
    let username = unique_username("checkin_none");

    let err = state
        .challenge_service
        .check_in(
            &username,
            "meatless-mondays",
            &CheckInInput {
                completed: true,
                notes: String::new(),
                carbon_saved: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        carbon_tracker::error::AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_join_api_messages() {
    require_emulator!();

    let (app, _) = common::create_emulator_app().await;
    let username = unique_username("join_api");
    let token = common::test_jwt(&username);

    let join_request = || {
        Request::builder()
            .method("POST")
            .uri("/api/challenges/meatless-mondays/join")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    };

    // First join succeeds with the challenge title in the message
    let response = app.clone().oneshot(join_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Successfully joined Meatless Mondays!");

    // Duplicate join is a 200 with success=false, not an error
    let response = app.oneshot(join_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "You have already joined this challenge!");

    println!("✓ Join API messages verified: username={}", username);
}

#[tokio::test]
async fn test_progress_api_flow() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let username = unique_username("progress_api");
    let token = common::test_jwt(&username);

    state
        .challenge_service
        .join(&username, "commute-smart")
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/challenges/commute-smart/progress")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"completed":true,"notes":"biked to work","carbon_saved":1.2}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Progress updated successfully!");
    assert_eq!(json["status"], "active");
    assert!(json["progress_percentage"].as_u64().unwrap() <= 100);

    println!("✓ Progress API verified: username={}", username);
}
