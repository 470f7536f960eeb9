//! Duel Ledger Library
//!
//! This module exposes the wagering ledger components for use by tests
//! and other consumers: the lifecycle of binary prediction duels over
//! parimutuel pools, with odds history and settled claim tracking.

pub mod config;
pub mod error;
pub mod models;
pub mod pool;
pub mod services;
pub mod settlement;
pub mod store;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError, LedgerResult};

use services::{AuditTrailService, ClaimTracker, DuelLedger, ProbabilityTracker};
use settlement::Settlement;
use std::sync::Arc;
use store::DuelStore;

/// Ledger state containing all wired services
///
/// The caller supplies the two external collaborators (record store and
/// settlement service); everything else is constructed here.
pub struct LedgerState {
    pub config: LedgerConfig,
    pub store: Arc<dyn DuelStore>,
    pub settlement: Arc<dyn Settlement>,
    pub ledger: Arc<DuelLedger>,
    pub probability: Arc<ProbabilityTracker>,
    pub claims: Arc<ClaimTracker>,
    pub audit: Option<Arc<AuditTrailService>>,
}

impl LedgerState {
    /// Create a new LedgerState with initialized services
    pub fn new(
        store: Arc<dyn DuelStore>,
        settlement: Arc<dyn Settlement>,
        config: LedgerConfig,
    ) -> Self {
        Self::with_audit(store, settlement, config, None)
    }

    /// Create a new LedgerState with an audit trail attached
    pub fn with_audit(
        store: Arc<dyn DuelStore>,
        settlement: Arc<dyn Settlement>,
        config: LedgerConfig,
        audit: Option<Arc<AuditTrailService>>,
    ) -> Self {
        let probability = Arc::new(ProbabilityTracker::new(
            store.clone(),
            config.sample_epsilon_pct,
        ));

        let ledger = Arc::new(DuelLedger::new(
            store.clone(),
            probability.clone(),
            audit.clone(),
            config.clone(),
        ));

        let claims = Arc::new(ClaimTracker::new(
            store.clone(),
            settlement.clone(),
            audit.clone(),
            config.max_write_retries,
        ));

        Self {
            config,
            store,
            settlement,
            ledger,
            probability,
            claims,
            audit,
        }
    }
}
