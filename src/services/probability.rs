use crate::error::{LedgerError, LedgerResult};
use crate::models::ProbabilitySample;
use crate::store::DuelStore;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Records the pool's derived odds over time
///
/// Odds move on every stake, so sampling is throttled: a new sample is
/// appended only when the yes probability moved by more than the
/// configured epsilon since the last recorded sample. History reads are
/// range queries over the stored samples, topped with a synthetic live
/// point so callers always see the present.
pub struct ProbabilityTracker {
    store: Arc<dyn DuelStore>,
    epsilon_pct: Decimal,
}

impl ProbabilityTracker {
    pub fn new(store: Arc<dyn DuelStore>, epsilon_pct: Decimal) -> Self {
        Self { store, epsilon_pct }
    }

    /// Offer a sample for the current stake totals
    ///
    /// Returns whether a sample was actually appended.
    pub async fn maybe_sample(
        &self,
        duel_id: Uuid,
        yes_total: Decimal,
        no_total: Decimal,
        now: NaiveDateTime,
    ) -> LedgerResult<bool> {
        let candidate = ProbabilitySample::capture(duel_id, yes_total, no_total, now);

        let moved = match self.store.last_sample(duel_id).await? {
            Some(last) => (candidate.yes_pct - last.yes_pct).abs() > self.epsilon_pct,
            None => true,
        };

        if !moved {
            debug!(
                "Sample for duel {} suppressed: odds within epsilon of last record",
                duel_id
            );
            return Ok(false);
        }

        self.store.append_sample(candidate).await?;
        Ok(true)
    }

    /// Historical odds for a duel: stored samples plus a live trailing point
    ///
    /// Stored samples are filtered to `timestamp >= since`, ascending,
    /// at most `limit`. A synthetic sample for the live odds is appended
    /// when they differ from the last returned sample by more than
    /// epsilon (or when nothing stored qualifies), and is never persisted.
    pub async fn history(
        &self,
        duel_id: Uuid,
        since: NaiveDateTime,
        limit: usize,
    ) -> LedgerResult<Vec<ProbabilitySample>> {
        let versioned = self
            .store
            .find_by_id(duel_id)
            .await?
            .ok_or(LedgerError::DuelNotFound(duel_id))?;

        let mut samples = self.store.find_samples_since(duel_id, since, limit).await?;

        let pool = versioned.duel.pool();
        let (yes_total, no_total) = pool.totals();
        let live = ProbabilitySample::capture(
            duel_id,
            yes_total,
            no_total,
            chrono::Utc::now().naive_utc(),
        );

        let trailing_needed = match samples.last() {
            Some(last) => (live.yes_pct - last.yes_pct).abs() > self.epsilon_pct,
            None => true,
        };

        if trailing_needed {
            samples.push(live);
        }

        Ok(samples)
    }
}
