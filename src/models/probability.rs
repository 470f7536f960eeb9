use crate::pool::ParimutuelPool;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One historical odds observation for a duel
///
/// Append-only, ordered by timestamp ascending within a duel. The two
/// percentages always sum to exactly 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilitySample {
    pub duel_id: Uuid,
    pub timestamp: NaiveDateTime,
    pub yes_total: Decimal,
    pub no_total: Decimal,
    pub yes_pct: Decimal,
    pub no_pct: Decimal,
}

impl ProbabilitySample {
    /// Capture the odds implied by the given stake totals
    pub fn capture(
        duel_id: Uuid,
        yes_total: Decimal,
        no_total: Decimal,
        timestamp: NaiveDateTime,
    ) -> Self {
        let (yes_pct, no_pct) = ParimutuelPool::with_totals(yes_total, no_total).odds();
        Self {
            duel_id,
            timestamp,
            yes_total,
            no_total,
            yes_pct,
            no_pct,
        }
    }
}
