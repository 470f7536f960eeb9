//! Durable record store boundary.
//!
//! The ledger persists duels through the [`DuelStore`] trait: versioned
//! reads, compare-and-swap writes, and an append-only probability sample
//! log with ordered range queries. An in-memory implementation backs the
//! test suite; production deployments supply their own.

pub mod memory;

pub use memory::MemoryDuelStore;

use crate::models::{Duel, ProbabilitySample};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when working with the record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duel not found: {0}")]
    NotFound(Uuid),

    #[error("Duplicate duel id: {0}")]
    DuplicateId(Uuid),

    #[error("Version conflict on duel {duel_id}: expected {expected}, found {actual}")]
    VersionConflict {
        duel_id: Uuid,
        expected: u64,
        actual: u64,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A duel record paired with its optimistic-concurrency version
#[derive(Debug, Clone)]
pub struct VersionedDuel {
    pub duel: Duel,
    pub version: u64,
}

/// Record store port for duels and probability samples
///
/// Writes are compare-and-swap on the record version: a write with a stale
/// `expected_version` fails with [`StoreError::VersionConflict`] and commits
/// nothing. Different duels never contend with each other.
#[async_trait]
pub trait DuelStore: Send + Sync {
    /// Insert a new duel at version 1
    async fn create(&self, duel: Duel) -> StoreResult<VersionedDuel>;

    /// Fetch a duel with its current version
    async fn find_by_id(&self, duel_id: Uuid) -> StoreResult<Option<VersionedDuel>>;

    /// Replace a duel if `expected_version` still matches
    async fn update(&self, duel: Duel, expected_version: u64) -> StoreResult<VersionedDuel>;

    /// Remove a duel if `expected_version` still matches
    async fn delete(&self, duel_id: Uuid, expected_version: u64) -> StoreResult<()>;

    /// Append one probability sample to the duel's history
    async fn append_sample(&self, sample: ProbabilitySample) -> StoreResult<()>;

    /// The most recent sample for a duel, if any
    async fn last_sample(&self, duel_id: Uuid) -> StoreResult<Option<ProbabilitySample>>;

    /// Samples with `timestamp >= since`, ascending, at most `limit`
    async fn find_samples_since(
        &self,
        duel_id: Uuid,
        since: NaiveDateTime,
        limit: usize,
    ) -> StoreResult<Vec<ProbabilitySample>>;
}
