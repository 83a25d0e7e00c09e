// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emission factor table and footprint calculator.
//!
//! Pure arithmetic, no side effects. Factors are static constants; rounding
//! happens only at the reporting boundary, never on intermediate terms.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::footprint::{FootprintRecord, FuelType, MealType, SubmitFootprintPayload, WasteType};

/// Average cruise speed used to convert flight hours to km.
const FLIGHT_SPEED_KMH: f64 = 900.0;
/// kg CO2 per flight km.
const FLIGHT_FACTOR: f64 = 0.255;
/// kg CO2 per public transport km.
const PUBLIC_TRANSPORT_FACTOR: f64 = 0.100;
/// kg CO2 per kWh.
const ELECTRICITY_FACTOR: f64 = 0.4;
/// Food intake is normalized to a 30-day month regardless of actual period.
const FOOD_DAYS_PER_MONTH: f64 = 30.0;

/// kg CO2 per car km by fuel type.
pub fn fuel_factor(fuel: FuelType) -> f64 {
    match fuel {
        FuelType::Petrol => 0.180,
        FuelType::Diesel => 0.160,
        FuelType::Electric => 0.060,
        FuelType::Hybrid => 0.090,
    }
}

/// kg CO2 per meal by meal type.
pub fn food_factor(meal: MealType) -> f64 {
    match meal {
        MealType::Light => 0.5,
        MealType::Medium => 1.2,
        MealType::Heavy => 2.0,
        MealType::MeatHeavy => 3.5,
    }
}

/// kg CO2 per kg of waste by waste intensity.
pub fn waste_factor(waste: WasteType) -> f64 {
    match waste {
        WasteType::Low => 0.3,
        WasteType::Medium => 0.8,
        WasteType::High => 1.5,
    }
}

/// Input fields the calculator consumes, independent of where they came
/// from (a fresh submission or a stored record).
#[derive(Debug, Clone, Copy)]
pub struct EmissionInputs {
    pub car_travel_km: f64,
    pub fuel_type: FuelType,
    pub flights_hours: f64,
    pub public_transport_km: f64,
    pub meals_per_day: u32,
    pub meal_type: MealType,
    pub electricity_kwh: f64,
    pub waste_kg: f64,
    pub waste_type: WasteType,
}

impl From<&SubmitFootprintPayload> for EmissionInputs {
    fn from(payload: &SubmitFootprintPayload) -> Self {
        Self {
            car_travel_km: payload.car_travel_km,
            fuel_type: payload.fuel_type,
            flights_hours: payload.flights_hours,
            public_transport_km: payload.public_transport_km,
            meals_per_day: payload.meals_per_day,
            meal_type: payload.meal_type,
            electricity_kwh: payload.electricity_kwh,
            waste_kg: payload.waste_kg,
            waste_type: payload.waste_type,
        }
    }
}

impl From<&FootprintRecord> for EmissionInputs {
    fn from(record: &FootprintRecord) -> Self {
        Self {
            car_travel_km: record.car_travel_km,
            fuel_type: record.fuel_type,
            flights_hours: record.flights_hours,
            public_transport_km: record.public_transport_km,
            meals_per_day: record.meals_per_day,
            meal_type: record.meal_type,
            electricity_kwh: record.electricity_kwh,
            waste_kg: record.waste_kg,
            waste_type: record.waste_type,
        }
    }
}

/// Per-category emissions and their total, in kg CO2, each rounded to
/// 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EmissionBreakdown {
    pub transportation: f64,
    pub food: f64,
    pub electricity: f64,
    pub waste: f64,
    pub total: f64,
}

/// Compute the category breakdown and total for one set of inputs.
///
/// The total is the rounded sum of the *unrounded* category terms, so it can
/// differ from the sum of the rounded categories by up to 2 cents of a kg.
pub fn calculate(inputs: &EmissionInputs) -> EmissionBreakdown {
    let transportation = inputs.car_travel_km * fuel_factor(inputs.fuel_type)
        + inputs.flights_hours * FLIGHT_SPEED_KMH * FLIGHT_FACTOR
        + inputs.public_transport_km * PUBLIC_TRANSPORT_FACTOR;
    let food = f64::from(inputs.meals_per_day) * food_factor(inputs.meal_type) * FOOD_DAYS_PER_MONTH;
    let electricity = inputs.electricity_kwh * ELECTRICITY_FACTOR;
    let waste = inputs.waste_kg * waste_factor(inputs.waste_type);

    EmissionBreakdown {
        transportation: round2(transportation),
        food: round2(food),
        electricity: round2(electricity),
        waste: round2(waste),
        total: round2(transportation + food + electricity + waste),
    }
}

/// Round to 2 decimal places, half away from zero. Applied at every
/// reporting boundary, including aggregate sums.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
