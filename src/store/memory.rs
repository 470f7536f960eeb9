use crate::models::{Duel, ProbabilitySample};
use crate::store::{DuelStore, StoreError, StoreResult, VersionedDuel};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory record store
///
/// Reference implementation of [`DuelStore`] used by the test suite.
/// Versioning semantics match what a transactional backend would provide:
/// every successful write bumps the version, and a stale write fails
/// without committing.
#[derive(Clone, Default)]
pub struct MemoryDuelStore {
    duels: Arc<tokio::sync::RwLock<HashMap<Uuid, VersionedDuel>>>,
    samples: Arc<tokio::sync::RwLock<HashMap<Uuid, Vec<ProbabilitySample>>>>,
}

impl MemoryDuelStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of duels currently stored (test introspection)
    pub async fn duel_count(&self) -> usize {
        self.duels.read().await.len()
    }

    /// Number of samples recorded for a duel (test introspection)
    pub async fn sample_count(&self, duel_id: Uuid) -> usize {
        self.samples
            .read()
            .await
            .get(&duel_id)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DuelStore for MemoryDuelStore {
    async fn create(&self, duel: Duel) -> StoreResult<VersionedDuel> {
        let mut duels = self.duels.write().await;
        if duels.contains_key(&duel.id) {
            return Err(StoreError::DuplicateId(duel.id));
        }

        let versioned = VersionedDuel { duel, version: 1 };
        duels.insert(versioned.duel.id, versioned.clone());
        Ok(versioned)
    }

    async fn find_by_id(&self, duel_id: Uuid) -> StoreResult<Option<VersionedDuel>> {
        let duels = self.duels.read().await;
        Ok(duels.get(&duel_id).cloned())
    }

    async fn update(&self, duel: Duel, expected_version: u64) -> StoreResult<VersionedDuel> {
        let mut duels = self.duels.write().await;
        let current = duels
            .get(&duel.id)
            .ok_or(StoreError::NotFound(duel.id))?;

        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                duel_id: duel.id,
                expected: expected_version,
                actual: current.version,
            });
        }

        let versioned = VersionedDuel {
            duel,
            version: expected_version + 1,
        };
        duels.insert(versioned.duel.id, versioned.clone());
        Ok(versioned)
    }

    async fn delete(&self, duel_id: Uuid, expected_version: u64) -> StoreResult<()> {
        let mut duels = self.duels.write().await;
        let current = duels.get(&duel_id).ok_or(StoreError::NotFound(duel_id))?;

        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                duel_id,
                expected: expected_version,
                actual: current.version,
            });
        }

        duels.remove(&duel_id);
        drop(duels);

        // A deleted duel takes its odds history with it
        self.samples.write().await.remove(&duel_id);
        Ok(())
    }

    async fn append_sample(&self, sample: ProbabilitySample) -> StoreResult<()> {
        let mut samples = self.samples.write().await;
        let history = samples.entry(sample.duel_id).or_insert_with(Vec::new);

        // Keep the history timestamp-ordered even for out-of-order appends
        let pos = history
            .iter()
            .rposition(|s| s.timestamp <= sample.timestamp)
            .map(|p| p + 1)
            .unwrap_or(0);
        history.insert(pos, sample);
        Ok(())
    }

    async fn last_sample(&self, duel_id: Uuid) -> StoreResult<Option<ProbabilitySample>> {
        let samples = self.samples.read().await;
        Ok(samples.get(&duel_id).and_then(|v| v.last().cloned()))
    }

    async fn find_samples_since(
        &self,
        duel_id: Uuid,
        since: NaiveDateTime,
        limit: usize,
    ) -> StoreResult<Vec<ProbabilitySample>> {
        let samples = self.samples.read().await;
        let history = match samples.get(&duel_id) {
            Some(history) => history,
            None => return Ok(Vec::new()),
        };

        Ok(history
            .iter()
            .filter(|s| s.timestamp >= since)
            .take(limit)
            .cloned()
            .collect())
    }
}
