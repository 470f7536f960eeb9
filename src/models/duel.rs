use crate::models::participant::ParticipantStake;
use crate::pool::ParimutuelPool;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Side of a binary duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// Convert from wire string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(Side::Yes),
            "no" => Ok(Side::No),
            _ => Err(format!("Invalid side: {}", s)),
        }
    }

    /// Convert to wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }

    /// The other side of the duel
    pub fn opposite(&self) -> Self {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Side> for String {
    fn from(side: Side) -> Self {
        side.as_str().to_string()
    }
}

/// Duel lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelStatus {
    Pending,
    Active,
    Resolved,
    Cancelled,
}

impl DuelStatus {
    /// Convert from wire string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(DuelStatus::Pending),
            "active" => Ok(DuelStatus::Active),
            "resolved" => Ok(DuelStatus::Resolved),
            "cancelled" => Ok(DuelStatus::Cancelled),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }

    /// Convert to wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            DuelStatus::Pending => "pending",
            DuelStatus::Active => "active",
            DuelStatus::Resolved => "resolved",
            DuelStatus::Cancelled => "cancelled",
        }
    }

    /// Resolved and Cancelled absorb all further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, DuelStatus::Resolved | DuelStatus::Cancelled)
    }

    /// Stakes are accepted only while Pending or Active
    pub fn accepts_stakes(&self) -> bool {
        matches!(self, DuelStatus::Pending | DuelStatus::Active)
    }
}

impl fmt::Display for DuelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DuelStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(DuelStatus::Pending)
    }
}

impl From<DuelStatus> for String {
    fn from(status: DuelStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Duel subject category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelCategory {
    Crypto,
    Weather,
    Sports,
    Meme,
    Local,
    Other,
}

impl DuelCategory {
    /// Convert from wire string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "crypto" => Ok(DuelCategory::Crypto),
            "weather" => Ok(DuelCategory::Weather),
            "sports" => Ok(DuelCategory::Sports),
            "meme" => Ok(DuelCategory::Meme),
            "local" => Ok(DuelCategory::Local),
            "other" => Ok(DuelCategory::Other),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }

    /// Convert to wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            DuelCategory::Crypto => "crypto",
            DuelCategory::Weather => "weather",
            DuelCategory::Sports => "sports",
            DuelCategory::Meme => "meme",
            DuelCategory::Local => "local",
            DuelCategory::Other => "other",
        }
    }
}

impl From<String> for DuelCategory {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(DuelCategory::Other)
    }
}

impl From<DuelCategory> for String {
    fn from(category: DuelCategory) -> Self {
        category.as_str().to_string()
    }
}

/// Visibility of a duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelKind {
    /// Open to any participant
    Public,
    /// Aimed at a specific opponent
    Challenge,
}

impl DuelKind {
    /// Convert from wire string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "public" => Ok(DuelKind::Public),
            "challenge" => Ok(DuelKind::Challenge),
            _ => Err(format!("Invalid duel kind: {}", s)),
        }
    }

    /// Convert to wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            DuelKind::Public => "public",
            DuelKind::Challenge => "challenge",
        }
    }
}

impl From<String> for DuelKind {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(DuelKind::Public)
    }
}

impl From<DuelKind> for String {
    fn from(kind: DuelKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Duel model representing one binary wagering pool
///
/// Pool totals are always derived from `participants`; no aggregate
/// is stored separately from the stakes it summarizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duel {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub question: String,
    pub category: DuelCategory,
    pub kind: DuelKind,
    /// The creator's opening commitment; metadata, never a pool entry
    pub proposed_stake: Decimal,
    pub deadline: NaiveDateTime,
    pub status: DuelStatus,
    pub outcome: Option<Side>,
    /// At most one entry per identity; repeat stakes accumulate
    pub participants: Vec<ParticipantStake>,
    /// Idempotency tokens already applied to this duel
    pub applied_tokens: HashSet<Uuid>,
    pub created_at: NaiveDateTime,
}

impl Duel {
    /// Create a new Duel in Pending state
    pub fn new(
        creator_id: Uuid,
        question: String,
        category: DuelCategory,
        kind: DuelKind,
        proposed_stake: Decimal,
        deadline: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            creator_id,
            question,
            category,
            kind,
            proposed_stake,
            deadline,
            status: DuelStatus::Pending,
            outcome: None,
            participants: Vec::new(),
            applied_tokens: HashSet::new(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Sum of all participant stakes
    pub fn pool_total(&self) -> Decimal {
        self.participants.iter().map(|p| p.stake).sum()
    }

    /// Sum of stakes on one side
    pub fn side_total(&self, side: Side) -> Decimal {
        self.participants
            .iter()
            .filter(|p| p.side == side)
            .map(|p| p.stake)
            .sum()
    }

    /// Build the accounting pool from the participant collection
    pub fn pool(&self) -> ParimutuelPool {
        ParimutuelPool::with_totals(self.side_total(Side::Yes), self.side_total(Side::No))
    }

    /// Find a participant's stake entry
    pub fn participant(&self, participant_id: Uuid) -> Option<&ParticipantStake> {
        self.participants
            .iter()
            .find(|p| p.participant_id == participant_id)
    }

    /// Find a participant's stake entry for mutation
    pub fn participant_mut(&mut self, participant_id: Uuid) -> Option<&mut ParticipantStake> {
        self.participants
            .iter_mut()
            .find(|p| p.participant_id == participant_id)
    }

    pub fn has_participants(&self) -> bool {
        !self.participants.is_empty()
    }

    /// Check if duel is resolved
    pub fn is_resolved(&self) -> bool {
        self.status == DuelStatus::Resolved
    }

    /// Check if duel reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
