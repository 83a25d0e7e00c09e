// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Footprint API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, AUTH_COOKIE};
use crate::models::footprint::remaining_submissions;
use crate::models::FootprintRecord;
use crate::services::emissions::{self, EmissionInputs};
use crate::services::leaderboard::{self, LeaderboardView};
use crate::services::tips;
use crate::services::{EmissionBreakdown, Period};
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339, today_utc};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{delete, get, post},
    Extension, Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/footprints",
            post(submit_footprint).get(get_footprints),
        )
        .route("/api/footprints/summary", get(get_summary))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/tips", get(get_tips))
        .route("/api/me", get(get_me))
        .route("/api/account", delete(delete_account))
}

// ─── Footprint Submission ────────────────────────────────────

/// Response for a recorded submission.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubmitResponse {
    pub message: String,
    /// Total emission in kg CO2 (same value as `emission_breakdown.total`).
    pub result: f64,
    pub emission_breakdown: EmissionBreakdown,
    pub level: String,
    pub remaining_today: u32,
    pub record_id: String,
}

/// Record a new footprint submission.
///
/// The daily quota check and the write happen in one transaction, so two
/// concurrent submissions cannot both pass the limit.
async fn submit_footprint(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Form(payload): Form<SubmitFootprintPayload>,
) -> Result<Json<SubmitResponse>> {
    payload.validate()?;

    let breakdown = emissions::calculate(&EmissionInputs::from(&payload));
    let created_at = chrono::Utc::now();

    let record = FootprintRecord {
        record_id: crate::db::firestore::new_footprint_doc_id(&user.username, created_at)?,
        owner: user.username.clone(),
        car_travel_km: payload.car_travel_km,
        fuel_type: payload.fuel_type,
        flights_hours: payload.flights_hours,
        public_transport_km: payload.public_transport_km,
        meals_per_day: payload.meals_per_day,
        meal_type: payload.meal_type,
        electricity_kwh: payload.electricity_kwh,
        waste_kg: payload.waste_kg,
        waste_type: payload.waste_type,
        created_at: format_utc_rfc3339(created_at),
        total_emission: breakdown.total,
    };

    let used = state.db.create_footprint_guarded(&record).await?;

    Ok(Json(SubmitResponse {
        message: "Carbon footprint recorded successfully!".to_string(),
        result: breakdown.total,
        emission_breakdown: breakdown,
        level: tips::emission_level(breakdown.total).to_string(),
        remaining_today: remaining_submissions(used),
        record_id: record.record_id,
    }))
}

use crate::models::SubmitFootprintPayload;

// ─── Footprint History ───────────────────────────────────────

#[derive(Deserialize)]
struct FootprintsQuery {
    /// Cursor for forward pagination (opaque token).
    cursor: Option<String>,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    50
}

const MAX_PER_PAGE: u32 = 100;

/// Decode and validate a pagination cursor. The token is the base64 of the
/// `created_at` bound the next page starts below.
fn parse_cursor(cursor: Option<&str>) -> Result<Option<String>> {
    cursor
        .map(|raw| {
            let invalid_cursor =
                || AppError::BadRequest("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = String::from_utf8(decoded).map_err(|_| invalid_cursor())?;

            if parse_utc_rfc3339(&decoded_str).is_none() {
                return Err(invalid_cursor());
            }

            Ok(decoded_str)
        })
        .transpose()
}

fn encode_cursor(created_at: &str) -> String {
    URL_SAFE_NO_PAD.encode(created_at)
}

/// One history row. The per-category breakdown is recomputed from the
/// stored inputs; only the total is persisted.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FootprintSummary {
    pub record_id: String,
    pub created_at: String,
    pub total_emission: f64,
    pub emission_breakdown: EmissionBreakdown,
}

impl From<&FootprintRecord> for FootprintSummary {
    fn from(record: &FootprintRecord) -> Self {
        Self {
            record_id: record.record_id.clone(),
            created_at: record.created_at.clone(),
            total_emission: record.total_emission,
            emission_breakdown: emissions::calculate(&EmissionInputs::from(record)),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FootprintsResponse {
    pub footprints: Vec<FootprintSummary>,
    pub per_page: u32,
    /// Total number of records in the response.
    /// For cursor-based pagination, this is 0 if `next_cursor` is present,
    /// as the exact total is not known.
    pub total: u32,
    pub next_cursor: Option<String>,
}

/// Get the caller's submission history, newest first.
async fn get_footprints(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<FootprintsQuery>,
) -> Result<Json<FootprintsResponse>> {
    tracing::debug!(
        username = %user.username,
        cursor = ?params.cursor,
        per_page = params.per_page,
        "Fetching footprint history"
    );

    let limit = params.per_page.min(MAX_PER_PAGE);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    // Fetch one extra item to determine if another page is available.
    let fetch_limit = limit.saturating_add(1);
    let mut records = state
        .db
        .get_footprints_for_user(&user.username, cursor.as_deref(), fetch_limit)
        .await?;

    let has_more = records.len() > limit as usize;
    if has_more {
        records.truncate(limit as usize);
    }

    let next_cursor = if has_more {
        records.last().map(|r| encode_cursor(&r.created_at))
    } else {
        None
    };

    let footprints: Vec<FootprintSummary> =
        records.iter().map(FootprintSummary::from).collect();

    // Cursor pagination doesn't provide a cheap exact total.
    // We return 0 if there are more results to indicate the total is unknown.
    let total = if next_cursor.is_some() {
        0
    } else {
        footprints.len() as u32
    };

    Ok(Json(FootprintsResponse {
        footprints,
        per_page: limit,
        total,
        next_cursor,
    }))
}

// ─── Dashboard Summary ───────────────────────────────────────

/// Aggregates over the caller's full history.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SummaryResponse {
    pub entry_count: u32,
    /// Lifetime total, kg CO2 (2 dp)
    pub total_emission: f64,
    /// Mean per submission, kg CO2 (2 dp); 0 when there are no records
    pub average_emission: f64,
    /// Per-category lifetime sums
    pub category_totals: EmissionBreakdown,
    pub latest: Option<FootprintSummary>,
    /// Level label of the latest submission
    pub level: Option<String>,
    pub remaining_today: u32,
}

/// Get dashboard aggregates for the current user.
async fn get_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SummaryResponse>> {
    tracing::debug!(username = %user.username, "Building footprint summary");

    let records = state.db.get_all_footprints_for_user(&user.username).await?;
    let used_today = state
        .db
        .count_footprints_for_day(&user.username, today_utc())
        .await?;

    let entry_count = records.len() as u32;

    let mut transportation = 0.0;
    let mut food = 0.0;
    let mut electricity = 0.0;
    let mut waste = 0.0;
    let mut total = 0.0;
    for record in &records {
        let breakdown = emissions::calculate(&EmissionInputs::from(record));
        transportation += breakdown.transportation;
        food += breakdown.food;
        electricity += breakdown.electricity;
        waste += breakdown.waste;
        total += record.total_emission;
    }

    let category_totals = EmissionBreakdown {
        transportation: emissions::round2(transportation),
        food: emissions::round2(food),
        electricity: emissions::round2(electricity),
        waste: emissions::round2(waste),
        total: emissions::round2(total),
    };

    let average_emission = if entry_count > 0 {
        emissions::round2(total / f64::from(entry_count))
    } else {
        0.0
    };

    // Records come back newest first.
    let latest = records.first().map(FootprintSummary::from);
    let level = latest
        .as_ref()
        .map(|l| tips::emission_level(l.total_emission).to_string());

    Ok(Json(SummaryResponse {
        entry_count,
        total_emission: category_totals.total,
        average_emission,
        category_totals,
        latest,
        level,
        remaining_today: remaining_submissions(used_today),
    }))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LeaderboardQuery {
    /// Time window: daily, weekly, monthly, or all
    #[serde(default)]
    period: Period,
}

/// Get the emissions ranking across all users for a period.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardView>> {
    tracing::debug!(
        username = %user.username,
        period = params.period.label(),
        "Building leaderboard"
    );

    let window_start = params
        .period
        .window_start(chrono::Utc::now())
        .map(format_utc_rfc3339);
    let records = state.db.get_footprints_since(window_start.as_deref()).await?;

    Ok(Json(leaderboard::build_leaderboard(&records, params.period)))
}

// ─── Tips ────────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TipsResponse {
    pub message: String,
    pub level: String,
    pub emission_breakdown: EmissionBreakdown,
    pub suggestions: Vec<String>,
    /// Free-form tip, generated or heuristic
    pub tip: String,
}

/// Get reduction suggestions based on the caller's latest submission.
async fn get_tips(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TipsResponse>> {
    let records = state
        .db
        .get_footprints_for_user(&user.username, None, 1)
        .await?;
    let Some(latest) = records.first() else {
        return Err(AppError::NotFound(
            "No footprint submissions yet".to_string(),
        ));
    };

    let breakdown = emissions::calculate(&EmissionInputs::from(latest));
    let level = tips::emission_level(breakdown.total);
    let suggestions = tips::suggestions(&breakdown);

    // Generated tip falls back to the heuristic one internally; this await
    // never fails the request.
    let tip = state.tip_service.tip_for(&breakdown).await;

    Ok(Json(TipsResponse {
        message: format!(
            "Tips based on your latest submission ({} kg CO2)",
            breakdown.total
        ),
        level: level.to_string(),
        emission_breakdown: breakdown,
        suggestions,
        tip,
    }))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub last_active: String,
    pub remaining_today: u32,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let profile = state
        .db
        .get_user(&user.username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.username)))?;

    let used_today = state
        .db
        .count_footprints_for_day(&user.username, today_utc())
        .await?;

    Ok(Json(MeResponse {
        username: profile.username,
        email: profile.email,
        created_at: profile.created_at,
        last_active: profile.last_active,
        remaining_today: remaining_submissions(used_today),
    }))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
}

/// Delete the caller's account and all associated data.
///
/// Removal order is progress entries, enrollments, footprints, then the
/// user document, so an interrupted run never leaves rows without an owner.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<DeleteAccountResponse>)> {
    tracing::info!(username = %user.username, "User-initiated account deletion");

    let deleted = state.db.delete_user_data(&user.username).await?;

    // The session is gone with the account.
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));

    Ok((
        jar,
        Json(DeleteAccountResponse {
            success: true,
            message: format!("Account deleted. {deleted} records removed."),
        }),
    ))
}
