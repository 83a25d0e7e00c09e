// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge catalog, enrollment, and progress models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::parse_utc_rfc3339;

/// Lifestyle category a challenge targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ChallengeCategory {
    Food,
    Transport,
    Waste,
    Energy,
    Shopping,
    Lifestyle,
}

/// Cadence of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DurationType {
    Daily,
    Weekly,
    Monthly,
    Ongoing,
}

/// Catalog entry. Seeded at startup, read-only reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeDefinition {
    /// Stable slug identifier (e.g. "meatless-mondays")
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: ChallengeCategory,
    pub duration_type: DurationType,
    /// 0 means ongoing (no end date)
    pub duration_days: u32,
    /// Estimated kg CO2 saved per completed day
    pub carbon_impact: f64,
    /// 1 (easy) to 3 (hard)
    pub difficulty_level: u8,
    /// Frontend accent color
    pub icon_color: String,
    pub is_active: bool,
}

/// Enrollment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Failed,
    Paused,
}

/// One user's participation in one challenge.
///
/// Document ID is `{username}_{challenge_id}`, so at most one enrollment
/// can exist per (owner, challenge) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub user: String,
    pub challenge_id: String,
    pub status: EnrollmentStatus,
    /// When the user (last) joined (RFC3339)
    pub start_date: String,
    /// `start_date + duration_days`; None for ongoing challenges
    pub end_date: Option<String>,
    /// Completion rate, 0 to 100
    pub progress_percentage: u8,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Enrollment {
    /// Whether the enrollment window has passed. Ongoing enrollments
    /// (no end date) never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_date
            .as_deref()
            .and_then(parse_utc_rfc3339)
            .is_some_and(|end| now > end)
    }

    /// Whole days until the end date, if one is set. Clamped at 0 once
    /// expired; `None` for ongoing enrollments.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.end_date
            .as_deref()
            .and_then(parse_utc_rfc3339)
            .map(|end| (end - now).num_days().max(0))
    }
}

/// One day's check-in for one enrollment.
///
/// Document ID is `{username}_{challenge_id}_{date}`, so re-submitting the
/// same day updates in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressEntry {
    pub user: String,
    pub challenge_id: String,
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    pub completed: bool,
    pub notes: String,
    /// kg CO2 saved; populated only when completed
    pub carbon_saved: Option<f64>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::format_utc_rfc3339;

    fn enrollment(end_date: Option<String>) -> Enrollment {
        Enrollment {
            user: "test_user".to_string(),
            challenge_id: "zero-waste-day".to_string(),
            status: EnrollmentStatus::Active,
            start_date: "2024-01-01T00:00:00.000Z".to_string(),
            end_date,
            progress_percentage: 0,
            notes: String::new(),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_ongoing_enrollment_never_expires() {
        let e = enrollment(None);
        let far_future = DateTime::from_timestamp(4_102_444_800, 0).unwrap();
        assert!(!e.is_expired(far_future));
        assert_eq!(e.days_remaining(far_future), None);
    }

    #[test]
    fn test_expiry_is_strictly_after_end_date() {
        let end = DateTime::from_timestamp(1_704_672_000, 0).unwrap();
        let e = enrollment(Some(format_utc_rfc3339(end)));

        assert!(!e.is_expired(end));
        assert!(e.is_expired(end + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_days_remaining_counts_down() {
        let end = DateTime::from_timestamp(1_704_672_000, 0).unwrap();
        let e = enrollment(Some(format_utc_rfc3339(end)));

        let now = end - chrono::Duration::days(3);
        assert_eq!(e.days_remaining(now), Some(3));

        let past_end = end + chrono::Duration::days(2);
        assert_eq!(e.days_remaining(past_end), Some(0));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&EnrollmentStatus::Active).unwrap(),
            "\"active\""
        );
        let status: EnrollmentStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, EnrollmentStatus::Failed);
    }
}
