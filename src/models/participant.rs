use crate::models::duel::Side;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One identity's position in a duel
///
/// Owned exclusively by the containing Duel. `stake` only grows, and only
/// by further stakes from the same identity on the same side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantStake {
    pub participant_id: Uuid,
    pub side: Side,
    pub stake: Decimal,
    /// Set exactly once, at resolution
    pub is_winner: bool,
    /// Zero unless a winner
    pub payout: Decimal,
    /// Set only by the claim flow, after settlement succeeds
    pub claimed: bool,
    /// Settlement transaction signature, recorded verbatim
    pub receipt: Option<String>,
    pub staked_at: NaiveDateTime,
}

impl ParticipantStake {
    /// Create a new ParticipantStake for a first stake
    pub fn new(participant_id: Uuid, side: Side, stake: Decimal) -> Self {
        Self {
            participant_id,
            side,
            stake,
            is_winner: false,
            payout: Decimal::ZERO,
            claimed: false,
            receipt: None,
            staked_at: chrono::Utc::now().naive_utc(),
        }
    }
}
