use crate::models::duel::Side;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for pool operations
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid stake: {0}")]
    InvalidStake(Decimal),
}

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Parimutuel pool accounting over a binary (yes/no) stake distribution
///
/// Pure functions over a `(yes_total, no_total)` pair. Odds are the share
/// of the pool staked on each side; an empty pool quotes even odds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParimutuelPool {
    yes_total: Decimal,
    no_total: Decimal,
}

impl ParimutuelPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool from existing side totals
    pub fn with_totals(yes_total: Decimal, no_total: Decimal) -> Self {
        Self {
            yes_total,
            no_total,
        }
    }

    /// Add a stake to one side
    ///
    /// Returns the new `(yes_total, no_total)` pair. Fails for
    /// non-positive amounts.
    pub fn add_stake(&mut self, side: Side, amount: Decimal) -> PoolResult<(Decimal, Decimal)> {
        if amount <= Decimal::ZERO {
            return Err(PoolError::InvalidStake(amount));
        }

        match side {
            Side::Yes => self.yes_total += amount,
            Side::No => self.no_total += amount,
        }

        Ok((self.yes_total, self.no_total))
    }

    /// Current odds as percentages, `(yes_pct, no_pct)`
    ///
    /// The yes side is computed by division; the no side is derived by
    /// subtraction from 100 so the pair always sums to exactly 100.
    pub fn odds(&self) -> (Decimal, Decimal) {
        let total = self.total();
        if total == Decimal::ZERO {
            let even = Decimal::new(50, 0);
            return (even, even);
        }

        let yes_pct = self.yes_total / total * Decimal::ONE_HUNDRED;
        let no_pct = Decimal::ONE_HUNDRED - yes_pct;
        (yes_pct, no_pct)
    }

    /// Sum of both sides
    pub fn total(&self) -> Decimal {
        self.yes_total + self.no_total
    }

    /// Current `(yes_total, no_total)` pair
    pub fn totals(&self) -> (Decimal, Decimal) {
        (self.yes_total, self.no_total)
    }

    /// Total staked on one side
    pub fn side_total(&self, side: Side) -> Decimal {
        match side {
            Side::Yes => self.yes_total,
            Side::No => self.no_total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total() == Decimal::ZERO
    }
}
