use crate::error::{LedgerError, LedgerResult};
use crate::services::audit::AuditTrailService;
use crate::settlement::{Settlement, SettlementReceipt};
use crate::store::{DuelStore, StoreError};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Tracks winnings claims and enforces at-most-one successful claim
/// per participant
///
/// The claimed flag lives on the stored participant record. Because the
/// check and the write straddle an external settlement call, a guard set
/// keyed by `(duel_id, participant_id)` is held across the call so the
/// settlement service can never be invoked twice concurrently for the
/// same participant.
pub struct ClaimTracker {
    store: Arc<dyn DuelStore>,
    settlement: Arc<dyn Settlement>,
    audit: Option<Arc<AuditTrailService>>,
    in_flight: Mutex<HashSet<(Uuid, Uuid)>>,
    max_write_retries: u32,
}

impl ClaimTracker {
    pub fn new(
        store: Arc<dyn DuelStore>,
        settlement: Arc<dyn Settlement>,
        audit: Option<Arc<AuditTrailService>>,
        max_write_retries: u32,
    ) -> Self {
        Self {
            store,
            settlement,
            audit,
            in_flight: Mutex::new(HashSet::new()),
            max_write_retries,
        }
    }

    /// Claim a winner's payout
    ///
    /// Checks eligibility, invokes the settlement service, then records
    /// the receipt and the claimed flag. A settlement failure leaves the
    /// record untouched and surfaces verbatim so the caller can retry.
    pub async fn claim(
        &self,
        duel_id: Uuid,
        participant_id: Uuid,
    ) -> LedgerResult<SettlementReceipt> {
        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert((duel_id, participant_id)) {
                return Err(LedgerError::ClaimInFlight);
            }
        }

        let result = self.claim_inner(duel_id, participant_id).await;

        {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.remove(&(duel_id, participant_id));
        }

        result
    }

    async fn claim_inner(
        &self,
        duel_id: Uuid,
        participant_id: Uuid,
    ) -> LedgerResult<SettlementReceipt> {
        info!(
            "Claim initiated: duel={}, participant={}",
            duel_id, participant_id
        );

        let versioned = self
            .store
            .find_by_id(duel_id)
            .await?
            .ok_or(LedgerError::DuelNotFound(duel_id))?;
        let duel = versioned.duel;

        if !duel.is_resolved() {
            return Err(LedgerError::DuelNotResolved(duel.status));
        }

        let participant = duel
            .participant(participant_id)
            .ok_or(LedgerError::ParticipantNotFound {
                duel_id,
                participant_id,
            })?;

        if !participant.is_winner {
            return Err(LedgerError::NotAWinner);
        }
        if participant.claimed {
            return Err(LedgerError::AlreadyClaimed);
        }

        let amount = participant.payout;
        let receipt = match self.settlement.settle(duel_id, participant_id, amount).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(
                    "Settlement failed for duel={}, participant={}: {}",
                    duel_id, participant_id, e
                );
                return Err(LedgerError::Settlement(e));
            }
        };

        self.record_receipt(duel_id, participant_id, &receipt)
            .await?;

        if let Some(audit) = &self.audit {
            if let Err(e) = audit
                .log_winnings_claimed(
                    duel_id,
                    participant_id,
                    amount,
                    &receipt.transaction_signature,
                )
                .await
            {
                warn!("Failed to audit claim for duel {}: {}", duel_id, e);
            }
        }

        info!(
            "Claim settled: duel={}, participant={}, amount={}, tx={}",
            duel_id, participant_id, amount, receipt.transaction_signature
        );

        Ok(receipt)
    }

    /// Write the claimed flag and receipt onto the stored record
    ///
    /// Settlement has already happened at this point, so a version
    /// conflict (another participant's claim landing first) must re-read
    /// and re-apply the flag rather than re-settle.
    async fn record_receipt(
        &self,
        duel_id: Uuid,
        participant_id: Uuid,
        receipt: &SettlementReceipt,
    ) -> LedgerResult<()> {
        let mut attempt: u32 = 0;
        loop {
            let versioned = self
                .store
                .find_by_id(duel_id)
                .await?
                .ok_or(LedgerError::DuelNotFound(duel_id))?;
            let mut duel = versioned.duel;

            let participant =
                duel.participant_mut(participant_id)
                    .ok_or(LedgerError::ParticipantNotFound {
                        duel_id,
                        participant_id,
                    })?;

            if participant.claimed {
                warn!(
                    "Participant {} on duel {} already marked claimed while recording receipt",
                    participant_id, duel_id
                );
                return Err(LedgerError::AlreadyClaimed);
            }

            participant.claimed = true;
            participant.receipt = Some(receipt.transaction_signature.clone());

            match self.store.update(duel, versioned.version).await {
                Ok(_) => return Ok(()),
                Err(StoreError::VersionConflict { .. }) if attempt < self.max_write_retries => {
                    attempt += 1;
                    warn!(
                        "Receipt write conflict on duel {}, retry {}",
                        duel_id, attempt
                    );
                }
                Err(StoreError::VersionConflict { .. }) => {
                    return Err(LedgerError::WriteConflict(attempt));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
