// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Carbon Tracker: personal carbon-footprint tracking backend
//!
//! This crate provides the API for recording lifestyle submissions,
//! computing emission estimates, and running reduction challenges.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{ChallengeService, TipService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub challenge_service: ChallengeService,
    pub tip_service: TipService,
}
