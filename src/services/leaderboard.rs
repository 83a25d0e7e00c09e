// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard ranking over footprint records.
//!
//! A pure fold: group records by owner, sum totals, rank ascending (lower
//! emissions is better). Recomputed from store contents on every request,
//! never cached.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::FootprintRecord;
use crate::services::emissions::round2;
use crate::time_utils::day_start;

/// Time window a leaderboard covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    #[default]
    All,
}

impl Period {
    /// Inclusive lower bound on `created_at` for this period, or `None`
    /// for the all-time board.
    pub fn window_start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Daily => Some(day_start(now.date_naive())),
            Period::Weekly => Some(now - chrono::Duration::days(7)),
            Period::Monthly => Some(now - chrono::Duration::days(30)),
            Period::All => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Daily => "Today",
            Period::Weekly => "This Week",
            Period::Monthly => "This Month",
            Period::All => "All Time",
        }
    }
}

/// One ranked row.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    /// 1-based, contiguous, no shared ranks
    pub rank: u32,
    pub username: String,
    /// Summed emissions for the period, kg CO2 (2 dp)
    pub total_emission: f64,
    pub entry_count: u32,
    /// Most recent submission timestamp in the period
    pub last_submission: Option<String>,
}

/// Full leaderboard response payload.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardView {
    pub period: String,
    pub entries: Vec<LeaderboardEntry>,
    pub total_users: u32,
    /// Sum across all ranked users, kg CO2 (2 dp)
    pub total_emissions: f64,
    /// Mean per user, kg CO2 (2 dp); 0 when the board is empty
    pub avg_emission: f64,
}

#[derive(Default)]
struct OwnerAccumulator {
    total: f64,
    count: u32,
    last_submission: Option<String>,
}

/// Build the ranking for records already filtered to the period window.
///
/// Ordering is ascending by (total, username); the username tie-break makes
/// the order deterministic for equal totals. Totals are rounded to 2 dp
/// before comparison so users whose sums agree at reporting precision
/// genuinely tie.
pub fn build_leaderboard(records: &[FootprintRecord], period: Period) -> LeaderboardView {
    let mut by_owner: HashMap<&str, OwnerAccumulator> = HashMap::new();

    for record in records {
        let acc = by_owner.entry(record.owner.as_str()).or_default();
        acc.total += record.total_emission;
        acc.count += 1;
        // Stored timestamps are fixed-width RFC3339, so max = most recent.
        if acc
            .last_submission
            .as_deref()
            .is_none_or(|prev| record.created_at.as_str() > prev)
        {
            acc.last_submission = Some(record.created_at.clone());
        }
    }

    let mut entries: Vec<LeaderboardEntry> = by_owner
        .into_iter()
        .map(|(owner, acc)| LeaderboardEntry {
            rank: 0,
            username: owner.to_string(),
            total_emission: round2(acc.total),
            entry_count: acc.count,
            last_submission: acc.last_submission,
        })
        .collect();

    entries.sort_by(|a, b| {
        a.total_emission
            .total_cmp(&b.total_emission)
            .then_with(|| a.username.cmp(&b.username))
    });
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index as u32 + 1;
    }

    let total_users = entries.len() as u32;
    let total_emissions = round2(entries.iter().map(|e| e.total_emission).sum());
    let avg_emission = if total_users > 0 {
        round2(total_emissions / f64::from(total_users))
    } else {
        0.0
    };

    LeaderboardView {
        period: period.label().to_string(),
        entries,
        total_users,
        total_emissions,
        avg_emission,
    }
}
