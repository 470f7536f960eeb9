use crate::models::{DuelStatus, Side};
use crate::pool::PoolError;
use crate::settlement::SettlementError;
use crate::store::StoreError;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Ledger-level error types
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Duel record missing from the store
    #[error("Duel not found: {0}")]
    DuelNotFound(Uuid),

    /// Participant has no stake on the duel
    #[error("Participant {participant_id} not found on duel {duel_id}")]
    ParticipantNotFound { duel_id: Uuid, participant_id: Uuid },

    /// Non-positive stake amount
    #[error("Invalid stake amount: {0}")]
    InvalidAmount(Decimal),

    /// Stake amount below the configured floor
    #[error("Stake {amount} below minimum {minimum}")]
    StakeBelowMinimum { amount: Decimal, minimum: Decimal },

    /// Malformed side string
    #[error("Invalid side: {0}")]
    InvalidSide(String),

    /// Question exceeds the configured length limit
    #[error("Question too long: {len} bytes (max {max})")]
    QuestionTooLong { len: usize, max: usize },

    /// Deadline not in the future at creation
    #[error("Deadline must be in the future")]
    InvalidDeadline,

    /// Stake placed at or after the deadline
    #[error("Deadline has passed")]
    DeadlinePassed,

    /// Duel is not in a stake-accepting state
    #[error("Duel is not accepting stakes (status: {0})")]
    DuelNotAcceptingStakes(DuelStatus),

    /// Creator attempted to stake on their own duel
    #[error("Creator cannot stake on their own duel")]
    SelfStakeForbidden,

    /// Participant attempted to stake the opposite side
    #[error("Side already chosen: {0}")]
    SideAlreadyChosen(Side),

    /// Resolution attempted before the deadline
    #[error("Resolution before deadline")]
    ResolutionTooEarly,

    /// Duel already resolved
    #[error("Duel already resolved")]
    AlreadyResolved,

    /// Duel already cancelled
    #[error("Duel already cancelled")]
    AlreadyCancelled,

    /// Operation not valid for a terminal duel
    #[error("Duel is in a terminal state: {0}")]
    TerminalState(DuelStatus),

    /// Caller lacks rights for the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Cancellation attempted with stakes in the pool
    #[error("Duel has {0} participant(s)")]
    HasParticipants(usize),

    /// Claim attempted before resolution
    #[error("Duel is not resolved (status: {0})")]
    DuelNotResolved(DuelStatus),

    /// Claim attempted by a losing participant
    #[error("Participant is not a winner")]
    NotAWinner,

    /// Winnings already claimed
    #[error("Winnings already claimed")]
    AlreadyClaimed,

    /// A claim for the same participant is already mid-settlement
    #[error("Claim already in flight")]
    ClaimInFlight,

    /// Optimistic write kept conflicting after bounded retries
    #[error("Write conflict persisted after {0} retries")]
    WriteConflict(u32),

    /// Payout sheet failed conservation validation
    #[error("Payout imbalance: distributed {distributed} of pool {pool}")]
    PayoutImbalance { distributed: Decimal, pool: Decimal },

    /// Pool accounting errors
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// External settlement call failed
    #[error("Settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for ledger errors
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Coarse error classification exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    IllegalTransition,
    Unauthorized,
    Conflict,
    SettlementFailure,
    Internal,
}

impl LedgerError {
    /// Classify the error for callers that branch on kind rather than variant
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::DuelNotFound(_) | LedgerError::ParticipantNotFound { .. } => {
                ErrorKind::NotFound
            }
            LedgerError::InvalidAmount(_)
            | LedgerError::StakeBelowMinimum { .. }
            | LedgerError::InvalidSide(_)
            | LedgerError::QuestionTooLong { .. }
            | LedgerError::InvalidDeadline
            | LedgerError::Pool(_)
            | LedgerError::Config(_) => ErrorKind::InvalidInput,
            LedgerError::DeadlinePassed
            | LedgerError::DuelNotAcceptingStakes(_)
            | LedgerError::ResolutionTooEarly
            | LedgerError::AlreadyResolved
            | LedgerError::AlreadyCancelled
            | LedgerError::TerminalState(_)
            | LedgerError::HasParticipants(_)
            | LedgerError::DuelNotResolved(_) => ErrorKind::IllegalTransition,
            LedgerError::Unauthorized(_)
            | LedgerError::SelfStakeForbidden
            | LedgerError::NotAWinner => ErrorKind::Unauthorized,
            LedgerError::SideAlreadyChosen(_)
            | LedgerError::AlreadyClaimed
            | LedgerError::ClaimInFlight
            | LedgerError::WriteConflict(_) => ErrorKind::Conflict,
            LedgerError::Settlement(_) => ErrorKind::SettlementFailure,
            LedgerError::Store(StoreError::VersionConflict { .. }) => ErrorKind::Conflict,
            LedgerError::Store(_)
            | LedgerError::PayoutImbalance { .. }
            | LedgerError::Serialization(_)
            | LedgerError::Message(_) => ErrorKind::Internal,
        }
    }

    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if error reflects contention rather than a logic fault
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidInput => 400,
            ErrorKind::IllegalTransition => 422,
            ErrorKind::Unauthorized => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::SettlementFailure => 502,
            ErrorKind::Internal => 500,
        }
    }
}

/// Convenience function to convert Option<T> to Result<T, LedgerError>
pub fn duel_or_not_found<T>(opt: Option<T>, duel_id: Uuid) -> LedgerResult<T> {
    opt.ok_or(LedgerError::DuelNotFound(duel_id))
}
