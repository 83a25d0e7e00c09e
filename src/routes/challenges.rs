// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge API routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{ChallengeDefinition, EnrollmentStatus, ProgressEntry};
use crate::services::challenges::{CheckInInput, JoinOutcome};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Challenge routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/challenges", get(list_challenges))
        .route("/api/challenges/mine", get(my_challenges))
        .route("/api/challenges/{id}/join", post(join_challenge))
        .route("/api/challenges/{id}/progress", post(record_progress))
}

// ─── Catalog ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengesResponse {
    pub challenges: Vec<ChallengeDefinition>,
    /// Challenge IDs the caller is actively enrolled in
    pub joined: Vec<String>,
}

/// List all active challenges plus the caller's active enrollments.
async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ChallengesResponse>> {
    tracing::debug!(username = %user.username, "Listing challenges");

    let challenges: Vec<ChallengeDefinition> = state
        .challenge_service
        .catalog()
        .active()
        .into_iter()
        .cloned()
        .collect();

    let joined: Vec<String> = state
        .db
        .get_active_enrollments(&user.username)
        .await?
        .into_iter()
        .map(|e| e.challenge_id)
        .collect();

    Ok(Json(ChallengesResponse { challenges, joined }))
}

// ─── Join ────────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct JoinResponse {
    pub success: bool,
    pub message: String,
}

/// Join a challenge. Re-joining after a completed or failed run restarts
/// the same enrollment; joining while already active is reported with
/// `success: false` rather than an error.
async fn join_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
) -> Result<Json<JoinResponse>> {
    let outcome = state
        .challenge_service
        .join(&user.username, &challenge_id)
        .await?;

    let response = match outcome {
        JoinOutcome::Joined { title } | JoinOutcome::Rearmed { title } => JoinResponse {
            success: true,
            message: format!("Successfully joined {title}!"),
        },
        JoinOutcome::AlreadyActive => JoinResponse {
            success: false,
            message: "You have already joined this challenge!".to_string(),
        },
    };

    Ok(Json(response))
}

// ─── My Challenges ───────────────────────────────────────────

/// One enrollment joined with its catalog definition and recent history.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MyChallengeEntry {
    pub challenge: ChallengeDefinition,
    pub status: EnrollmentStatus,
    pub start_date: String,
    pub end_date: Option<String>,
    /// Days until the window closes; None for ongoing challenges
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub days_remaining: Option<i64>,
    pub progress_percentage: u8,
    /// Freshly computed rate, which can differ from the stored one if no
    /// check-in has happened today
    pub completion_rate: u8,
    /// Last 7 check-ins, newest first
    pub recent_progress: Vec<ProgressEntry>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MyChallengesResponse {
    pub challenges: Vec<MyChallengeEntry>,
}

/// Get the caller's active enrollments with progress.
async fn my_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MyChallengesResponse>> {
    tracing::debug!(username = %user.username, "Listing joined challenges");

    let now = chrono::Utc::now();
    let progress = state.challenge_service.my_challenges(&user.username).await?;

    let challenges = progress
        .into_iter()
        .map(|p| MyChallengeEntry {
            days_remaining: p.enrollment.days_remaining(now),
            status: p.enrollment.status,
            start_date: p.enrollment.start_date,
            end_date: p.enrollment.end_date,
            progress_percentage: p.enrollment.progress_percentage,
            completion_rate: p.completion_rate,
            recent_progress: p.recent_progress,
            challenge: p.definition,
        })
        .collect();

    Ok(Json(MyChallengesResponse { challenges }))
}

// ─── Daily Check-in ──────────────────────────────────────────

/// Daily check-in payload.
#[derive(Deserialize, Validate)]
pub struct ProgressPayload {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub carbon_saved: Option<f64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressResponse {
    pub success: bool,
    pub message: String,
    pub status: EnrollmentStatus,
    pub progress_percentage: u8,
}

/// Record today's check-in for a joined challenge. Same-day re-submission
/// updates the existing entry.
async fn record_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
    Json(payload): Json<ProgressPayload>,
) -> Result<Json<ProgressResponse>> {
    payload.validate()?;

    let input = CheckInInput {
        completed: payload.completed,
        notes: payload.notes,
        carbon_saved: payload.carbon_saved,
    };

    let outcome = state
        .challenge_service
        .check_in(&user.username, &challenge_id, &input)
        .await?;

    Ok(Json(ProgressResponse {
        success: true,
        message: "Progress updated successfully!".to_string(),
        status: outcome.status,
        progress_percentage: outcome.progress_percentage,
    }))
}
