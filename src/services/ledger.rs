use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Duel, DuelCategory, DuelKind, DuelStatus, ParticipantStake, Side};
use crate::services::audit::AuditTrailService;
use crate::services::payout::PayoutCalculator;
use crate::services::probability::ProbabilityTracker;
use crate::store::{DuelStore, StoreError};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Service owning the duel lifecycle and its pool accounting
///
/// Every mutation is a load, validate, mutate-copy, compare-and-swap
/// write. A version conflict means another caller committed first; the
/// operation retries from a fresh read a bounded number of times before
/// surfacing the conflict. Mutations on different duels never contend.
pub struct DuelLedger {
    store: Arc<dyn DuelStore>,
    tracker: Arc<ProbabilityTracker>,
    audit: Option<Arc<AuditTrailService>>,
    config: LedgerConfig,
}

/// Result of a successful stake placement
pub struct StakeOutcome {
    pub duel: Duel,
    pub yes_pct: Decimal,
    pub no_pct: Decimal,
    pub pool_total: Decimal,
}

impl StakeOutcome {
    fn from_duel(duel: Duel) -> Self {
        let (yes_pct, no_pct) = duel.pool().odds();
        let pool_total = duel.pool_total();
        Self {
            duel,
            yes_pct,
            no_pct,
            pool_total,
        }
    }
}

impl DuelLedger {
    pub fn new(
        store: Arc<dyn DuelStore>,
        tracker: Arc<ProbabilityTracker>,
        audit: Option<Arc<AuditTrailService>>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            tracker,
            audit,
            config,
        }
    }

    /// Open a new duel in Pending state
    pub async fn open_duel(
        &self,
        creator_id: Uuid,
        question: String,
        category: DuelCategory,
        kind: DuelKind,
        proposed_stake: Decimal,
        deadline: NaiveDateTime,
    ) -> LedgerResult<Duel> {
        info!(
            "Opening duel: creator={}, category={}, deadline={}",
            creator_id,
            category.as_str(),
            deadline
        );

        if question.len() > self.config.max_question_len {
            return Err(LedgerError::QuestionTooLong {
                len: question.len(),
                max: self.config.max_question_len,
            });
        }

        if proposed_stake < self.config.min_stake {
            return Err(LedgerError::StakeBelowMinimum {
                amount: proposed_stake,
                minimum: self.config.min_stake,
            });
        }

        if deadline <= chrono::Utc::now().naive_utc() {
            return Err(LedgerError::InvalidDeadline);
        }

        let duel = Duel::new(
            creator_id,
            question,
            category,
            kind,
            proposed_stake,
            deadline,
        );
        let versioned = self.store.create(duel).await?;

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_duel_opened(&versioned.duel).await {
                warn!("Failed to audit duel creation {}: {}", versioned.duel.id, e);
            }
        }

        Ok(versioned.duel)
    }

    /// Place a stake on one side of a duel
    ///
    /// Repeat stakes from the same identity accumulate into the existing
    /// entry; staking the opposite side is rejected. The first accepted
    /// stake flips the duel from Pending to Active. An idempotency token
    /// that was already applied returns the current state unchanged.
    pub async fn place_stake(
        &self,
        duel_id: Uuid,
        participant_id: Uuid,
        side: Side,
        amount: Decimal,
        token: Option<Uuid>,
    ) -> LedgerResult<StakeOutcome> {
        info!(
            "Placing stake: duel={}, participant={}, side={}, amount={}",
            duel_id, participant_id, side, amount
        );

        let mut attempt: u32 = 0;
        let committed = loop {
            let versioned = self
                .store
                .find_by_id(duel_id)
                .await?
                .ok_or(LedgerError::DuelNotFound(duel_id))?;
            let mut duel = versioned.duel;

            if let Some(token) = token {
                if duel.applied_tokens.contains(&token) {
                    info!(
                        "Stake token {} already applied to duel {}, returning current state",
                        token, duel_id
                    );
                    return Ok(StakeOutcome::from_duel(duel));
                }
            }

            if !duel.status.accepts_stakes() {
                return Err(LedgerError::DuelNotAcceptingStakes(duel.status));
            }
            if chrono::Utc::now().naive_utc() >= duel.deadline {
                return Err(LedgerError::DeadlinePassed);
            }
            if participant_id == duel.creator_id {
                return Err(LedgerError::SelfStakeForbidden);
            }
            if amount <= Decimal::ZERO {
                return Err(LedgerError::InvalidAmount(amount));
            }
            if amount < self.config.min_stake {
                return Err(LedgerError::StakeBelowMinimum {
                    amount,
                    minimum: self.config.min_stake,
                });
            }

            match duel.participant_mut(participant_id) {
                Some(existing) if existing.side != side => {
                    return Err(LedgerError::SideAlreadyChosen(existing.side));
                }
                Some(existing) => {
                    existing.stake += amount;
                }
                None => {
                    duel.participants
                        .push(ParticipantStake::new(participant_id, side, amount));
                }
            }

            if duel.status == DuelStatus::Pending {
                duel.status = DuelStatus::Active;
            }

            if let Some(token) = token {
                duel.applied_tokens.insert(token);
            }

            match self.store.update(duel, versioned.version).await {
                Ok(v) => break v.duel,
                Err(StoreError::VersionConflict { .. })
                    if attempt < self.config.max_write_retries =>
                {
                    attempt += 1;
                    warn!("Stake write conflict on duel {}, retry {}", duel_id, attempt);
                }
                Err(StoreError::VersionConflict { .. }) => {
                    return Err(LedgerError::WriteConflict(attempt));
                }
                Err(e) => return Err(e.into()),
            }
        };

        // Offer a sample for the committed totals; sampling never fails a stake
        let (yes_total, no_total) = committed.pool().totals();
        if let Err(e) = self
            .tracker
            .maybe_sample(duel_id, yes_total, no_total, chrono::Utc::now().naive_utc())
            .await
        {
            warn!("Failed to record probability sample for duel {}: {}", duel_id, e);
        }

        if let Some(audit) = &self.audit {
            if let Err(e) = audit
                .log_stake_placed(duel_id, participant_id, side, amount, committed.pool_total())
                .await
            {
                warn!("Failed to audit stake on duel {}: {}", duel_id, e);
            }
        }

        Ok(StakeOutcome::from_duel(committed))
    }

    /// Resolve a duel to its outcome and freeze payouts
    ///
    /// Legal only for the creator, at or after the deadline, from a
    /// non-terminal state. The payout sheet is computed over the snapshot
    /// carried by one compare-and-swap write, so no concurrent stake can
    /// land inside it.
    pub async fn resolve(
        &self,
        duel_id: Uuid,
        caller_id: Uuid,
        outcome: Side,
    ) -> LedgerResult<Duel> {
        info!(
            "Resolving duel: duel={}, caller={}, outcome={}",
            duel_id, caller_id, outcome
        );

        let mut attempt: u32 = 0;
        let committed = loop {
            let versioned = self
                .store
                .find_by_id(duel_id)
                .await?
                .ok_or(LedgerError::DuelNotFound(duel_id))?;
            let mut duel = versioned.duel;

            if caller_id != duel.creator_id {
                return Err(LedgerError::Unauthorized(
                    "Only the creator can resolve a duel".to_string(),
                ));
            }
            match duel.status {
                DuelStatus::Resolved => return Err(LedgerError::AlreadyResolved),
                DuelStatus::Cancelled => return Err(LedgerError::AlreadyCancelled),
                _ => {}
            }
            if chrono::Utc::now().naive_utc() < duel.deadline {
                return Err(LedgerError::ResolutionTooEarly);
            }

            let sheet = PayoutCalculator::compute(&duel.participants, outcome)?;
            for p in duel.participants.iter_mut() {
                p.is_winner = sheet.is_winner(p.participant_id);
                p.payout = sheet.payout_for(p.participant_id);
            }
            duel.outcome = Some(outcome);
            duel.status = DuelStatus::Resolved;

            match self.store.update(duel, versioned.version).await {
                Ok(v) => break v.duel,
                Err(StoreError::VersionConflict { .. })
                    if attempt < self.config.max_write_retries =>
                {
                    attempt += 1;
                    warn!(
                        "Resolution write conflict on duel {}, retry {}",
                        duel_id, attempt
                    );
                }
                Err(StoreError::VersionConflict { .. }) => {
                    return Err(LedgerError::WriteConflict(attempt));
                }
                Err(e) => return Err(e.into()),
            }
        };

        let winner_count = committed.participants.iter().filter(|p| p.is_winner).count();
        info!(
            "Duel {} resolved {}: pool={}, winners={}",
            duel_id,
            outcome,
            committed.pool_total(),
            winner_count
        );

        if let Some(audit) = &self.audit {
            if let Err(e) = audit
                .log_duel_resolved(duel_id, outcome, committed.pool_total(), winner_count, caller_id)
                .await
            {
                warn!("Failed to audit resolution of duel {}: {}", duel_id, e);
            }
        }

        Ok(committed)
    }

    /// Cancel a duel that nobody has staked on
    ///
    /// The record persists as history in Cancelled state.
    pub async fn cancel(&self, duel_id: Uuid, caller_id: Uuid) -> LedgerResult<Duel> {
        info!("Cancelling duel: duel={}, caller={}", duel_id, caller_id);

        let mut attempt: u32 = 0;
        let committed = loop {
            let versioned = self
                .store
                .find_by_id(duel_id)
                .await?
                .ok_or(LedgerError::DuelNotFound(duel_id))?;
            let mut duel = versioned.duel;

            self.check_cancellable(&duel, caller_id)?;

            duel.status = DuelStatus::Cancelled;

            match self.store.update(duel, versioned.version).await {
                Ok(v) => break v.duel,
                Err(StoreError::VersionConflict { .. })
                    if attempt < self.config.max_write_retries =>
                {
                    attempt += 1;
                    warn!(
                        "Cancellation write conflict on duel {}, retry {}",
                        duel_id, attempt
                    );
                }
                Err(StoreError::VersionConflict { .. }) => {
                    return Err(LedgerError::WriteConflict(attempt));
                }
                Err(e) => return Err(e.into()),
            }
        };

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_duel_cancelled(duel_id, caller_id).await {
                warn!("Failed to audit cancellation of duel {}: {}", duel_id, e);
            }
        }

        Ok(committed)
    }

    /// Delete a duel record entirely
    ///
    /// Same guards as cancellation; the record is removed rather than
    /// kept as history.
    pub async fn delete(&self, duel_id: Uuid, caller_id: Uuid) -> LedgerResult<()> {
        info!("Deleting duel: duel={}, caller={}", duel_id, caller_id);

        let mut attempt: u32 = 0;
        loop {
            let versioned = self
                .store
                .find_by_id(duel_id)
                .await?
                .ok_or(LedgerError::DuelNotFound(duel_id))?;

            self.check_cancellable(&versioned.duel, caller_id)?;

            match self.store.delete(duel_id, versioned.version).await {
                Ok(()) => return Ok(()),
                Err(StoreError::VersionConflict { .. })
                    if attempt < self.config.max_write_retries =>
                {
                    attempt += 1;
                    warn!("Delete conflict on duel {}, retry {}", duel_id, attempt);
                }
                Err(StoreError::VersionConflict { .. }) => {
                    return Err(LedgerError::WriteConflict(attempt));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fetch a duel
    pub async fn get(&self, duel_id: Uuid) -> LedgerResult<Duel> {
        let versioned = self
            .store
            .find_by_id(duel_id)
            .await?
            .ok_or(LedgerError::DuelNotFound(duel_id))?;
        Ok(versioned.duel)
    }

    /// Live odds quote, `(yes_pct, no_pct)`, without mutating anything
    pub async fn quote(&self, duel_id: Uuid) -> LedgerResult<(Decimal, Decimal)> {
        let duel = self.get(duel_id).await?;
        Ok(duel.pool().odds())
    }

    fn check_cancellable(&self, duel: &Duel, caller_id: Uuid) -> LedgerResult<()> {
        if caller_id != duel.creator_id {
            return Err(LedgerError::Unauthorized(
                "Only the creator can cancel a duel".to_string(),
            ));
        }
        if duel.status.is_terminal() {
            return Err(LedgerError::TerminalState(duel.status));
        }
        if duel.has_participants() {
            return Err(LedgerError::HasParticipants(duel.participants.len()));
        }
        Ok(())
    }
}
