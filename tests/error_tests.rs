// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error-to-response mapping tests.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use carbon_tracker::error::AppError;
use validator::Validate;

async fn response_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_quota_exceeded_maps_to_429() {
    let (status, body) = response_json(AppError::QuotaExceeded { used: 3 }).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "daily_limit_reached");

    let details = body["details"].as_str().unwrap();
    assert!(details.contains("3 of 3"));
    assert!(details.contains("Resets tomorrow"));
}

#[tokio::test]
async fn test_validation_maps_to_400() {
    let (status, body) =
        response_json(AppError::Validation("car_travel_km: must be non-negative".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].as_str().unwrap().contains("car_travel_km"));
}

#[tokio::test]
async fn test_conflict_maps_to_409() {
    let (status, body) = response_json(AppError::Conflict("Username already taken".into())).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_not_found_maps_to_404() {
    let (status, body) = response_json(AppError::NotFound("Challenge 'x' not found".into())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_unauthorized_maps_to_401() {
    let (status, body) = response_json(AppError::Unauthorized).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_database_error_hides_details() {
    let (status, body) = response_json(AppError::Database("connection refused".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    // Internals never leak into the response body
    assert!(body.get("details").is_none());
}

#[test]
fn test_validator_errors_flatten_sorted() {
    use carbon_tracker::models::RegisterRequest;

    let bad = RegisterRequest {
        username: "ab".to_string(),
        email: "not-an-email".to_string(),
        password: "short".to_string(),
    };

    let err: AppError = bad.validate().unwrap_err().into();
    let AppError::Validation(details) = err else {
        panic!("expected Validation variant");
    };

    // One entry per failing field, joined and sorted by field name
    assert!(details.contains("email:"));
    assert!(details.contains("password:"));
    assert!(details.contains("username:"));
    let email_pos = details.find("email:").unwrap();
    let password_pos = details.find("password:").unwrap();
    let username_pos = details.find("username:").unwrap();
    assert!(email_pos < password_pos && password_pos < username_pos);
}
