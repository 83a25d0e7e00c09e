// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge catalog and enrollment/progress engine.
//!
//! The catalog is compiled-in reference data. Enrollment state lives in
//! Firestore; the completion-rate and status-transition rules are pure
//! functions evaluated after every check-in.

use chrono::{DateTime, NaiveDate, Utc};

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::challenge::{
    ChallengeCategory, ChallengeDefinition, DurationType, Enrollment, EnrollmentStatus,
    ProgressEntry,
};
use crate::time_utils::{format_date, format_utc_rfc3339, parse_date, parse_utc_rfc3339};

/// Ongoing challenges are scored over a rolling window of this many days.
const ONGOING_WINDOW_DAYS: u32 = 30;

/// How many recent check-ins to return per challenge in listings.
const RECENT_PROGRESS_DAYS: usize = 7;

// ─── Catalog ─────────────────────────────────────────────────

/// The seeded challenge definitions, keyed by stable slug.
#[derive(Clone)]
pub struct ChallengeCatalog {
    definitions: Vec<ChallengeDefinition>,
}

impl ChallengeCatalog {
    /// Built-in catalog. Definitions are reference data; enrollments refer
    /// to them by slug, so slugs must stay stable across releases.
    pub fn seeded() -> Self {
        use ChallengeCategory::*;
        use DurationType::*;

        let definitions = vec![
            def(
                "meatless-mondays",
                "Meatless Mondays",
                "Skip meat for one day a week. Reducing meat consumption is one of the most effective ways to lower your carbon footprint from food.",
                Food, Weekly, 7, 2.5, 1, "green",
            ),
            def(
                "commute-smart",
                "Commute Smart",
                "Ditch the car! For 30 days, try to walk, bike, or use public transport for your daily commute at least twice a week.",
                Transport, Monthly, 30, 15.0, 2, "blue",
            ),
            def(
                "plastic-free-week",
                "Plastic Free Week",
                "Aim to avoid single-use plastics for an entire week. This includes bags, bottles, straws, and food packaging. Every piece matters!",
                Waste, Weekly, 7, 1.8, 2, "yellow",
            ),
            def(
                "home-energy-saver",
                "Home Energy Saver",
                "Reduce your home electricity usage by 10% this month. Unplug devices, switch to LEDs, and be mindful of your energy consumption.",
                Energy, Monthly, 30, 8.5, 2, "purple",
            ),
            def(
                "waste-not-challenge",
                "Waste Not Challenge",
                "For two weeks, actively work to reduce your household food waste. Plan meals, use leftovers creatively, and compost scraps.",
                Waste, Weekly, 14, 3.2, 1, "red",
            ),
            def(
                "go-local",
                "Go Local",
                "Commit to buying locally grown produce whenever possible. This reduces \"food miles\" and supports your local community farmers.",
                Shopping, Ongoing, 0, 5.0, 1, "indigo",
            ),
            def(
                "zero-waste-day",
                "Zero Waste Day",
                "Challenge yourself to produce zero waste for an entire day. Plan ahead and be creative with reusing items.",
                Waste, Daily, 1, 0.8, 3, "gray",
            ),
            def(
                "digital-detox-hour",
                "Digital Detox Hour",
                "Reduce screen time and electronic device usage for one hour daily. This saves energy and improves well-being.",
                Energy, Daily, 30, 1.2, 1, "teal",
            ),
        ];

        Self { definitions }
    }

    pub fn all(&self) -> &[ChallengeDefinition] {
        &self.definitions
    }

    /// Definitions currently offered to users.
    pub fn active(&self) -> Vec<&ChallengeDefinition> {
        self.definitions.iter().filter(|d| d.is_active).collect()
    }

    pub fn get(&self, id: &str) -> Option<&ChallengeDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }
}

#[allow(clippy::too_many_arguments)]
fn def(
    id: &str,
    title: &str,
    description: &str,
    category: ChallengeCategory,
    duration_type: DurationType,
    duration_days: u32,
    carbon_impact: f64,
    difficulty_level: u8,
    icon_color: &str,
) -> ChallengeDefinition {
    ChallengeDefinition {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category,
        duration_type,
        duration_days,
        carbon_impact,
        difficulty_level,
        icon_color: icon_color.to_string(),
        is_active: true,
    }
}

// ─── Pure scoring rules ──────────────────────────────────────

/// Completion rate in percent, 0 to 100.
///
/// Ongoing challenges (duration 0) are scored over the last 30 days;
/// timed challenges from the enrollment's start date. The numerator is the
/// number of completed check-ins dated on or after the window start.
pub fn completion_rate(
    duration_days: u32,
    start_date: NaiveDate,
    entries: &[ProgressEntry],
    today: NaiveDate,
) -> u8 {
    let (window_start, denominator) = if duration_days == 0 {
        (
            today - chrono::Duration::days(i64::from(ONGOING_WINDOW_DAYS)),
            ONGOING_WINDOW_DAYS,
        )
    } else {
        (start_date, duration_days)
    };

    if denominator == 0 {
        return 0;
    }

    let completed_days = entries
        .iter()
        .filter(|e| e.completed)
        .filter(|e| parse_date(&e.date).is_some_and(|d| d >= window_start))
        .count();

    let rate = (completed_days as f64 / f64::from(denominator) * 100.0).floor();
    rate.min(100.0) as u8
}

/// Status transition rule, evaluated after every check-in.
///
/// Full completion always wins; an expired enrollment completes at >= 80%
/// and fails below 50%. An expired enrollment in the [50, 80) band keeps
/// its current status.
pub fn next_status(
    current: EnrollmentStatus,
    completion_rate: u8,
    expired: bool,
) -> EnrollmentStatus {
    if completion_rate >= 100 || (expired && completion_rate >= 80) {
        EnrollmentStatus::Completed
    } else if expired && completion_rate < 50 {
        EnrollmentStatus::Failed
    } else {
        current
    }
}

/// End date for an enrollment started now; `None` for ongoing challenges.
fn end_date_for(duration_days: u32, start: DateTime<Utc>) -> Option<String> {
    (duration_days > 0)
        .then(|| format_utc_rfc3339(start + chrono::Duration::days(i64::from(duration_days))))
}

// ─── Enrollment service ──────────────────────────────────────

/// Outcome of a join request.
#[derive(Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    /// New enrollment created
    Joined { title: String },
    /// Existing non-active enrollment re-armed in place
    Rearmed { title: String },
    /// Already actively enrolled; informational, not an error
    AlreadyActive,
}

/// Daily check-in input.
#[derive(Debug, Clone)]
pub struct CheckInInput {
    pub completed: bool,
    pub notes: String,
    pub carbon_saved: Option<f64>,
}

/// Result of a check-in after the transition rule has run.
#[derive(Debug, Clone, Copy)]
pub struct CheckInOutcome {
    pub status: EnrollmentStatus,
    pub progress_percentage: u8,
}

/// One active enrollment with its definition and recent history, for
/// listing endpoints.
pub struct EnrollmentProgress {
    pub enrollment: Enrollment,
    pub definition: ChallengeDefinition,
    pub recent_progress: Vec<ProgressEntry>,
    pub completion_rate: u8,
}

/// Orchestrates joins and check-ins against the store.
#[derive(Clone)]
pub struct ChallengeService {
    catalog: ChallengeCatalog,
    db: FirestoreDb,
}

impl ChallengeService {
    pub fn new(db: FirestoreDb) -> Self {
        Self {
            catalog: ChallengeCatalog::seeded(),
            db,
        }
    }

    pub fn catalog(&self) -> &ChallengeCatalog {
        &self.catalog
    }

    /// Join a challenge, or re-arm a finished enrollment.
    ///
    /// At most one enrollment exists per (user, challenge): the document ID
    /// is derived from both, so create and re-arm are both upserts on the
    /// same document.
    pub async fn join(&self, username: &str, challenge_id: &str) -> Result<JoinOutcome> {
        let definition = self
            .catalog
            .get(challenge_id)
            .ok_or_else(|| AppError::NotFound(format!("Challenge '{challenge_id}' not found")))?;

        let now = Utc::now();
        let stamp = format_utc_rfc3339(now);

        match self.db.get_enrollment(username, challenge_id).await? {
            Some(existing) if existing.status == EnrollmentStatus::Active => {
                tracing::debug!(username, challenge_id, "Join rejected: already active");
                Ok(JoinOutcome::AlreadyActive)
            }
            Some(mut existing) => {
                // Re-arm in place. The end date is recomputed from the new
                // start so a re-armed timed challenge gets a fresh window.
                existing.status = EnrollmentStatus::Active;
                existing.start_date = stamp.clone();
                existing.end_date = end_date_for(definition.duration_days, now);
                existing.progress_percentage = 0;
                existing.updated_at = stamp;
                self.db.upsert_enrollment(&existing).await?;

                tracing::info!(username, challenge_id, "Re-armed enrollment");
                Ok(JoinOutcome::Rearmed {
                    title: definition.title.clone(),
                })
            }
            None => {
                let enrollment = Enrollment {
                    user: username.to_string(),
                    challenge_id: challenge_id.to_string(),
                    status: EnrollmentStatus::Active,
                    start_date: stamp.clone(),
                    end_date: end_date_for(definition.duration_days, now),
                    progress_percentage: 0,
                    notes: String::new(),
                    created_at: stamp.clone(),
                    updated_at: stamp,
                };
                self.db.upsert_enrollment(&enrollment).await?;

                tracing::info!(username, challenge_id, "Joined challenge");
                Ok(JoinOutcome::Joined {
                    title: definition.title.clone(),
                })
            }
        }
    }

    /// Record today's check-in and re-run the transition rule.
    ///
    /// The progress document ID is derived from (user, challenge, date), so
    /// re-submitting the same day updates the entry in place.
    pub async fn check_in(
        &self,
        username: &str,
        challenge_id: &str,
        input: &CheckInInput,
    ) -> Result<CheckInOutcome> {
        let definition = self
            .catalog
            .get(challenge_id)
            .ok_or_else(|| AppError::NotFound(format!("Challenge '{challenge_id}' not found")))?;

        let mut enrollment = self
            .db
            .get_enrollment(username, challenge_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Not enrolled in challenge '{challenge_id}'"))
            })?;

        let now = Utc::now();
        let today = now.date_naive();

        let entry = ProgressEntry {
            user: username.to_string(),
            challenge_id: challenge_id.to_string(),
            date: format_date(today),
            completed: input.completed,
            notes: input.notes.clone(),
            carbon_saved: input.carbon_saved.filter(|_| input.completed),
            created_at: format_utc_rfc3339(now),
        };
        self.db.upsert_progress_entry(&entry).await?;

        let entries = self.db.get_progress_entries(username, challenge_id).await?;
        let start_date = parse_utc_rfc3339(&enrollment.start_date)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "Invalid start_date on enrollment {username}/{challenge_id}"
                ))
            })?;

        let rate = completion_rate(definition.duration_days, start_date, &entries, today);
        let status = next_status(enrollment.status, rate, enrollment.is_expired(now));

        enrollment.progress_percentage = rate;
        enrollment.status = status;
        enrollment.updated_at = format_utc_rfc3339(now);
        self.db.upsert_enrollment(&enrollment).await?;

        tracing::info!(
            username,
            challenge_id,
            completed = input.completed,
            rate,
            status = ?status,
            "Check-in recorded"
        );

        Ok(CheckInOutcome {
            status,
            progress_percentage: rate,
        })
    }

    /// Active enrollments with their recent check-in history and a freshly
    /// computed completion rate.
    pub async fn my_challenges(&self, username: &str) -> Result<Vec<EnrollmentProgress>> {
        let enrollments = self.db.get_active_enrollments(username).await?;
        let today = Utc::now().date_naive();

        let mut out = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let Some(definition) = self.catalog.get(&enrollment.challenge_id) else {
                tracing::warn!(
                    username,
                    challenge_id = %enrollment.challenge_id,
                    "Enrollment references unknown challenge; skipping"
                );
                continue;
            };

            let mut entries = self
                .db
                .get_progress_entries(username, &enrollment.challenge_id)
                .await?;

            let start_date = parse_utc_rfc3339(&enrollment.start_date)
                .map(|dt| dt.date_naive())
                .unwrap_or(today);
            let rate = completion_rate(definition.duration_days, start_date, &entries, today);

            // Dates are "YYYY-MM-DD" so a string sort is chronological.
            entries.sort_by(|a, b| b.date.cmp(&a.date));
            entries.truncate(RECENT_PROGRESS_DAYS);

            out.push(EnrollmentProgress {
                definition: definition.clone(),
                recent_progress: entries,
                completion_rate: rate,
                enrollment,
            });
        }

        Ok(out)
    }
}
