use async_trait::async_trait;
use chrono::NaiveDateTime;
use duel_ledger::config::LedgerConfig;
use duel_ledger::models::{Duel, DuelCategory, DuelKind, ProbabilitySample};
use duel_ledger::settlement::{Settlement, SettlementError, SettlementReceipt};
use duel_ledger::store::{DuelStore, MemoryDuelStore};
use duel_ledger::LedgerState;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Settlement double that counts invocations and can be switched to fail
pub struct MockSettlement {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl MockSettlement {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
        }
    }

    /// Total settle invocations, successful or not
    pub fn settle_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Artificial latency, to widen race windows in concurrency tests
    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::SeqCst);
    }
}

#[async_trait]
impl Settlement for MockSettlement {
    async fn settle(
        &self,
        duel_id: Uuid,
        participant_id: Uuid,
        amount: Decimal,
    ) -> Result<SettlementReceipt, SettlementError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(SettlementError::Unavailable(
                "mock settlement switched to fail".to_string(),
            ));
        }

        Ok(SettlementReceipt {
            transaction_signature: format!("mock_tx_{}", Uuid::new_v4()),
            duel_id,
            participant_id,
            amount,
            settled_at: chrono::Utc::now().naive_utc(),
        })
    }
}

/// Test harness wiring the ledger against in-memory collaborators
pub struct TestLedger {
    pub state: LedgerState,
    pub store: Arc<MemoryDuelStore>,
    pub settlement: Arc<MockSettlement>,
}

impl TestLedger {
    /// Create a test ledger with default configuration
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Create a test ledger with custom configuration
    pub fn with_config(config: LedgerConfig) -> Self {
        init_tracing();

        let store = Arc::new(MemoryDuelStore::new());
        let settlement = Arc::new(MockSettlement::new());
        let state = LedgerState::new(store.clone(), settlement.clone(), config);

        Self {
            state,
            store,
            settlement,
        }
    }
}

/// Test identity and duel fixtures
pub struct TestFixtures {
    pub creator: Uuid,
    pub alice: Uuid,
    pub bob: Uuid,
    pub carol: Uuid,
    pub duel: Duel,
}

impl TestFixtures {
    /// Create fixtures with one open duel and three would-be participants
    pub async fn create(t: &TestLedger) -> Self {
        let creator = Uuid::new_v4();
        let duel = open_test_duel(t, creator).await;

        Self {
            creator,
            alice: Uuid::new_v4(),
            bob: Uuid::new_v4(),
            carol: Uuid::new_v4(),
            duel,
        }
    }
}

/// Open a duel with sensible defaults and a deadline one hour out
pub async fn open_test_duel(t: &TestLedger, creator_id: Uuid) -> Duel {
    t.state
        .ledger
        .open_duel(
            creator_id,
            "Will it rain in Lisbon tomorrow?".to_string(),
            DuelCategory::Weather,
            DuelKind::Public,
            Decimal::new(1, 0),
            future_deadline(3600),
        )
        .await
        .expect("Failed to open test duel")
}

/// Rewrite a duel's deadline into the past so resolution becomes legal
pub async fn expire_duel(t: &TestLedger, duel_id: Uuid) {
    let versioned = t
        .store
        .find_by_id(duel_id)
        .await
        .expect("Failed to read duel")
        .expect("Duel should exist");

    let mut duel = versioned.duel;
    duel.deadline = chrono::Utc::now().naive_utc() - chrono::Duration::seconds(1);

    t.store
        .update(duel, versioned.version)
        .await
        .expect("Failed to expire duel");
}

/// Build an unstored duel with default fields
pub fn make_duel(creator_id: Uuid) -> Duel {
    Duel::new(
        creator_id,
        "Will the home team win on Saturday?".to_string(),
        DuelCategory::Sports,
        DuelKind::Public,
        Decimal::new(1, 0),
        future_deadline(3600),
    )
}

/// Build a probability sample from whole-unit stake totals
pub fn make_sample(duel_id: Uuid, yes: i64, no: i64, at: NaiveDateTime) -> ProbabilitySample {
    ProbabilitySample::capture(duel_id, Decimal::new(yes, 0), Decimal::new(no, 0), at)
}

/// A timestamp `secs` seconds from now
pub fn future_deadline(secs: i64) -> NaiveDateTime {
    chrono::Utc::now().naive_utc() + chrono::Duration::seconds(secs)
}

/// A timestamp `secs` seconds in the past
pub fn past_deadline(secs: i64) -> NaiveDateTime {
    chrono::Utc::now().naive_utc() - chrono::Duration::seconds(secs)
}

/// Install a test subscriber once per binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
