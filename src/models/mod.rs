// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod challenge;
pub mod footprint;
pub mod user;

pub use challenge::{
    ChallengeCategory, ChallengeDefinition, DurationType, Enrollment, EnrollmentStatus,
    ProgressEntry,
};
pub use footprint::{FootprintRecord, FuelType, MealType, SubmitFootprintPayload, WasteType};
pub use user::{LoginRequest, RegisterRequest, User};
