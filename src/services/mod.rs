// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod challenges;
pub mod emissions;
pub mod leaderboard;
pub mod password;
pub mod tips;

pub use challenges::{ChallengeCatalog, ChallengeService, JoinOutcome};
pub use emissions::EmissionBreakdown;
pub use leaderboard::Period;
pub use tips::TipService;
