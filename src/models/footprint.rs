// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Footprint record model and submission payload.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Maximum footprint submissions per user per UTC calendar day.
pub const DAILY_SUBMISSION_LIMIT: u32 = 3;

/// Remaining submissions for today given the count already used.
pub fn remaining_submissions(used: u32) -> u32 {
    DAILY_SUBMISSION_LIMIT.saturating_sub(used)
}

/// Whether another submission is allowed today.
pub fn can_submit(used: u32) -> bool {
    used < DAILY_SUBMISSION_LIMIT
}

/// Vehicle fuel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    #[default]
    Petrol,
    Diesel,
    Electric,
    Hybrid,
}

/// Typical meal composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Light,
    #[default]
    Medium,
    Heavy,
    MeatHeavy,
}

/// Household waste intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasteType {
    Low,
    #[default]
    Medium,
    High,
}

/// Stored footprint record in Firestore.
///
/// Input fields are fixed at creation; `total_emission` is computed at
/// creation from those fields and never edited afterwards. Each submission
/// is a new record, never an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintRecord {
    /// Document ID: `{owner}_{millis}_{hex}` (creation-unique)
    pub record_id: String,
    /// Owning username
    pub owner: String,
    /// Car travel in km for the reporting period
    pub car_travel_km: f64,
    pub fuel_type: FuelType,
    /// Flight time in hours
    pub flights_hours: f64,
    /// Public transport travel in km
    pub public_transport_km: f64,
    /// Meals eaten per day
    pub meals_per_day: u32,
    pub meal_type: MealType,
    /// Electricity usage in kWh
    pub electricity_kwh: f64,
    /// Waste produced in kg
    pub waste_kg: f64,
    pub waste_type: WasteType,
    /// Creation timestamp (RFC3339, set once)
    pub created_at: String,
    /// Total emission in kg CO2, computed at creation
    pub total_emission: f64,
}

/// Form-encoded submission payload.
///
/// Every field is optional on the wire and defaults to the neutral value;
/// unknown enum values are rejected during deserialization rather than
/// scored as zero.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitFootprintPayload {
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub car_travel_km: f64,
    #[serde(default)]
    pub fuel_type: FuelType,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub flights_hours: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub public_transport_km: f64,
    #[serde(default = "default_meals_per_day")]
    #[validate(range(min = 1, max = 10, message = "must be between 1 and 10"))]
    pub meals_per_day: u32,
    #[serde(default)]
    pub meal_type: MealType,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub electricity_kwh: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub waste_kg: f64,
    #[serde(default)]
    pub waste_type: WasteType,
}

fn default_meals_per_day() -> u32 {
    3
}
