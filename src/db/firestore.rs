// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage, keyed by username)
//! - Footprints (immutable submission records)
//! - Enrollments (one document per user/challenge pair)
//! - Challenge progress (daily check-in entries)

use crate::db::collections;
use crate::error::AppError;
use crate::models::challenge::{Enrollment, ProgressEntry};
use crate::models::{footprint, FootprintRecord, User};
use crate::time_utils;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Document ID for an enrollment. Derived from (user, challenge) so at most
/// one enrollment per pair can exist.
fn enrollment_doc_id(user: &str, challenge_id: &str) -> String {
    format!("{}_{}", user, urlencoding::encode(challenge_id))
}

/// Document ID for a check-in entry. Derived from (user, challenge, date) so
/// a same-day re-submission writes the same document.
fn progress_doc_id(user: &str, challenge_id: &str, date: &str) -> String {
    format!("{}_{}_{}", user, urlencoding::encode(challenge_id), date)
}

/// Generate a creation-unique footprint document ID.
///
/// `{owner}_{millis}_{hex}`: the random suffix keeps same-millisecond
/// submissions distinct.
pub fn new_footprint_doc_id(
    owner: &str,
    created_at: chrono::DateTime<chrono::Utc>,
) -> Result<String, AppError> {
    let rng = ring::rand::SystemRandom::new();
    let mut suffix = [0u8; 4];
    ring::rand::SecureRandom::fill(&rng, &mut suffix)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG unavailable")))?;

    Ok(format!(
        "{}_{}_{}",
        owner,
        created_at.timestamp_millis(),
        hex::encode(suffix)
    ))
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by username (usernames are document IDs).
    pub async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(username)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user profile.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.username)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Footprint Operations ────────────────────────────────────

    /// Footprints for one user, newest first, with keyset pagination.
    ///
    /// `before` is the `created_at` of the last record on the previous page;
    /// the fixed-width timestamp format makes the range filter chronological.
    pub async fn get_footprints_for_user(
        &self,
        owner: &str,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<FootprintRecord>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FOOTPRINTS);

        let owner = owner.to_string();
        let query = if let Some(before) = before {
            let before = before.to_string();
            query.filter(move |q| {
                q.for_all([
                    q.field("owner").eq(owner.clone()),
                    q.field("created_at").less_than(before.clone()),
                ])
            })
        } else {
            query.filter(move |q| q.field("owner").eq(owner.clone()))
        };

        query
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every footprint record owned by a user, newest first.
    pub async fn get_all_footprints_for_user(
        &self,
        owner: &str,
    ) -> Result<Vec<FootprintRecord>, AppError> {
        let owner = owner.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::FOOTPRINTS)
            .filter(move |q| q.field("owner").eq(owner.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All footprint records created at or after the given timestamp, across
    /// all users. `None` scans the whole collection.
    pub async fn get_footprints_since(
        &self,
        window_start: Option<&str>,
    ) -> Result<Vec<FootprintRecord>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FOOTPRINTS);

        let query = if let Some(start) = window_start {
            let start = start.to_string();
            query.filter(move |q| q.field("created_at").greater_than_or_equal(start.clone()))
        } else {
            query
        };

        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count submissions by a user within one UTC calendar day.
    ///
    /// Always counted from the store, never from in-process state, so every
    /// instance sees the same number.
    pub async fn count_footprints_for_day(
        &self,
        owner: &str,
        date: chrono::NaiveDate,
    ) -> Result<u32, AppError> {
        let (day_start, day_end) = time_utils::utc_day_bounds(date);
        let owner = owner.to_string();

        let records: Vec<FootprintRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FOOTPRINTS)
            .filter(move |q| {
                q.for_all([
                    q.field("owner").eq(owner.clone()),
                    q.field("created_at").greater_than_or_equal(day_start.clone()),
                    q.field("created_at").less_than(day_end.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(records.len() as u32)
    }

    /// Store multiple footprint records.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn batch_set_footprints(
        &self,
        records: &[FootprintRecord],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(records.to_vec())
            .map(|record| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::FOOTPRINTS)
                    .document_id(&record.record_id)
                    .object(&record)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    // ─── Atomic Footprint Creation ──────────────────────────────

    /// Atomically create a footprint record, enforcing the daily limit.
    ///
    /// The count of today's submissions and the staged create share one
    /// Firestore transaction, so two racing submissions cannot both slip
    /// under the limit. Returns the number of submissions used today
    /// including the new record.
    pub async fn create_footprint_guarded(
        &self,
        record: &FootprintRecord,
    ) -> Result<u32, AppError> {
        let owner = record.owner.as_str();
        let date = time_utils::parse_utc_rfc3339(&record.created_at)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| {
                AppError::Database(format!(
                    "Invalid created_at on footprint record: {}",
                    record.created_at
                ))
            })?;

        // Begin a transaction
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Count today's submissions within the transaction window
        let used = self.count_footprints_for_day(owner, date).await?;

        // 2. Reject when the limit is already reached
        if !footprint::can_submit(used) {
            let _ = transaction.rollback().await;
            tracing::info!(owner, used, "Daily submission limit reached");
            return Err(AppError::QuotaExceeded { used });
        }

        // 3. Add the record write to the transaction
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::FOOTPRINTS)
            .document_id(&record.record_id)
            .object(record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add footprint to transaction: {}", e))
            })?;

        // 4. Commit the transaction atomically
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            owner,
            record_id = %record.record_id,
            used = used + 1,
            "Footprint recorded"
        );

        Ok(used + 1)
    }

    // ─── Enrollment Operations ───────────────────────────────────

    /// Get a user's enrollment in a challenge, if any.
    pub async fn get_enrollment(
        &self,
        username: &str,
        challenge_id: &str,
    ) -> Result<Option<Enrollment>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ENROLLMENTS)
            .obj()
            .one(&enrollment_doc_id(username, challenge_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update an enrollment.
    ///
    /// The document ID is derived from (user, challenge), so join and re-arm
    /// write the same document.
    pub async fn upsert_enrollment(&self, enrollment: &Enrollment) -> Result<(), AppError> {
        let doc_id = enrollment_doc_id(&enrollment.user, &enrollment.challenge_id);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ENROLLMENTS)
            .document_id(&doc_id)
            .object(enrollment)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All enrollments a user currently has in active status.
    pub async fn get_active_enrollments(
        &self,
        username: &str,
    ) -> Result<Vec<Enrollment>, AppError> {
        let username = username.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ENROLLMENTS)
            .filter(move |q| {
                q.for_all([
                    q.field("user").eq(username.clone()),
                    q.field("status").eq("active"),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Challenge Progress Operations ───────────────────────────

    /// Create or update the check-in entry for (user, challenge, date).
    pub async fn upsert_progress_entry(&self, entry: &ProgressEntry) -> Result<(), AppError> {
        let doc_id = progress_doc_id(&entry.user, &entry.challenge_id, &entry.date);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGE_PROGRESS)
            .document_id(&doc_id)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All check-in entries for a user's enrollment in one challenge.
    pub async fn get_progress_entries(
        &self,
        username: &str,
        challenge_id: &str,
    ) -> Result<Vec<ProgressEntry>, AppError> {
        let username = username.to_string();
        let challenge_id = challenge_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGE_PROGRESS)
            .filter(move |q| {
                q.for_all([
                    q.field("user").eq(username.clone()),
                    q.field("challenge_id").eq(challenge_id.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── User Data Deletion ────────────────────────────────────────

    /// Delete ALL data owned by a user.
    ///
    /// Deletes from all collections:
    /// - `challenge_progress` (query by user)
    /// - `enrollments` (query by user)
    /// - `footprints` (query by owner)
    /// - `users/{username}`
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, username: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // 1. Delete all check-in entries
        let user = username.to_string();
        let entries: Vec<ProgressEntry> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGE_PROGRESS)
            .filter(move |q| q.field("user").eq(user.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = entries.len();
        self.batch_delete(
            &entries,
            collections::CHALLENGE_PROGRESS,
            |entry: &ProgressEntry| progress_doc_id(&entry.user, &entry.challenge_id, &entry.date),
        )
        .await?;

        deleted_count += count;
        tracing::debug!(username, count, "Deleted challenge progress entries");

        // 2. Delete all enrollments
        let user = username.to_string();
        let enrollments: Vec<Enrollment> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ENROLLMENTS)
            .filter(move |q| q.field("user").eq(user.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = enrollments.len();
        self.batch_delete(
            &enrollments,
            collections::ENROLLMENTS,
            |enrollment: &Enrollment| {
                enrollment_doc_id(&enrollment.user, &enrollment.challenge_id)
            },
        )
        .await?;

        deleted_count += count;
        tracing::debug!(username, count, "Deleted enrollments");

        // 3. Delete all footprint records
        let owner = username.to_string();
        let footprints: Vec<FootprintRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FOOTPRINTS)
            .filter(move |q| q.field("owner").eq(owner.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = footprints.len();
        self.batch_delete(&footprints, collections::FOOTPRINTS, |record: &FootprintRecord| {
            record.record_id.clone()
        })
        .await?;

        deleted_count += count;
        tracing::debug!(username, count, "Deleted footprint records");

        // 4. Delete user profile
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(username)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        deleted_count += 1;
        tracing::debug!(username, "Deleted user profile");

        tracing::info!(username, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}
