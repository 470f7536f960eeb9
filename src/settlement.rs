//! Settlement service boundary.
//!
//! Funds movement happens outside the ledger. The claim flow calls
//! [`Settlement::settle`] and records the returned receipt verbatim;
//! the ledger never inspects what the settlement system did internally.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the settlement collaborator
///
/// Never retried inside the ledger; retry policy belongs to the caller.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Settlement rejected: {0}")]
    Rejected(String),

    #[error("Settlement service unavailable: {0}")]
    Unavailable(String),

    #[error("Settlement timed out")]
    Timeout,
}

/// Receipt returned by a successful settlement call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub transaction_signature: String,
    pub duel_id: Uuid,
    pub participant_id: Uuid,
    pub amount: Decimal,
    pub settled_at: NaiveDateTime,
}

/// Opaque funds-movement port
#[async_trait]
pub trait Settlement: Send + Sync {
    /// Move `amount` to the participant; the result is authoritative
    async fn settle(
        &self,
        duel_id: Uuid,
        participant_id: Uuid,
        amount: Decimal,
    ) -> Result<SettlementReceipt, SettlementError>;
}
