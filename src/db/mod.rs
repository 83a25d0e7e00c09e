//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const FOOTPRINTS: &str = "footprints";
    pub const ENROLLMENTS: &str = "enrollments";
    /// Daily check-in entries (keyed by user, challenge and date)
    pub const CHALLENGE_PROGRESS: &str = "challenge_progress";
}
