use crate::error::{LedgerError, LedgerResult};
use crate::models::{ParticipantStake, Side};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

/// Computed payout distribution for one resolved duel
///
/// A pure function of the final participants snapshot and the winning
/// side; computed exactly once at resolution and never revised.
#[derive(Debug, Clone)]
pub struct PayoutSheet {
    pub winning_side: Side,
    pub total_pool: Decimal,
    pub winning_total: Decimal,
    /// Winners only; absent participants receive zero
    payouts: HashMap<Uuid, Decimal>,
}

impl PayoutSheet {
    /// Payout owed to a participant, zero for losers
    pub fn payout_for(&self, participant_id: Uuid) -> Decimal {
        self.payouts
            .get(&participant_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Whether the participant staked on the winning side
    pub fn is_winner(&self, participant_id: Uuid) -> bool {
        self.payouts.contains_key(&participant_id)
    }

    pub fn winner_count(&self) -> usize {
        self.payouts.len()
    }

    /// Sum of all computed payouts
    pub fn total_distributed(&self) -> Decimal {
        self.payouts.values().sum()
    }
}

/// Parimutuel payout computation with zero platform fee
pub struct PayoutCalculator;

impl PayoutCalculator {
    /// Compute each winner's share of the pool
    ///
    /// Every winner receives their principal plus a pro-rata share of the
    /// losing side, which works out to `stake / winning_total * total_pool`.
    /// When nobody staked the winning side the resolution is degenerate:
    /// no winners, nothing distributed.
    pub fn compute(
        participants: &[ParticipantStake],
        winning_side: Side,
    ) -> LedgerResult<PayoutSheet> {
        let total_pool: Decimal = participants.iter().map(|p| p.stake).sum();
        let winning_total: Decimal = participants
            .iter()
            .filter(|p| p.side == winning_side)
            .map(|p| p.stake)
            .sum();

        if winning_total == Decimal::ZERO {
            return Ok(PayoutSheet {
                winning_side,
                total_pool,
                winning_total,
                payouts: HashMap::new(),
            });
        }

        let mut payouts = HashMap::new();
        for p in participants.iter().filter(|p| p.side == winning_side) {
            let payout = p.stake / winning_total * total_pool;
            payouts.insert(p.participant_id, payout);
        }

        let sheet = PayoutSheet {
            winning_side,
            total_pool,
            winning_total,
            payouts,
        };
        sheet.validate()?;
        Ok(sheet)
    }
}

impl PayoutSheet {
    /// Conservation check: the whole pool is redistributed, nothing retained
    fn validate(&self) -> LedgerResult<()> {
        let distributed = self.total_distributed();
        let drift = (distributed - self.total_pool).abs();
        if drift > Decimal::new(1, 9) {
            return Err(LedgerError::PayoutImbalance {
                distributed,
                pool: self.total_pool,
            });
        }
        Ok(())
    }
}
