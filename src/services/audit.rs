use crate::error::{LedgerError, LedgerResult};
use crate::models::{Duel, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: i64,
    pub event_type: String, // "duel_opened", "stake_placed", "duel_resolved", etc.
    pub duel_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub details: serde_json::Value,
}

/// Audit trail service for logging all ledger mutations
///
/// Append-only JSON lines, one file per day. Best-effort: callers log
/// failures and carry on rather than failing the operation.
pub struct AuditTrailService {
    #[allow(dead_code)]
    log_file: PathBuf,
    file_handle: Arc<Mutex<std::fs::File>>,
}

impl AuditTrailService {
    /// Create a new audit trail service
    pub fn new(log_directory: PathBuf) -> LedgerResult<Self> {
        std::fs::create_dir_all(&log_directory)
            .map_err(|e| LedgerError::Message(format!("Failed to create log directory: {}", e)))?;

        let date = chrono::Utc::now().format("%Y-%m-%d");
        let log_file = log_directory.join(format!("audit_{}.log", date));

        // Open file in append mode
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .map_err(|e| LedgerError::Message(format!("Failed to open audit log file: {}", e)))?;

        info!("Audit trail initialized: {:?}", log_file);

        Ok(Self {
            log_file,
            file_handle: Arc::new(Mutex::new(file)),
        })
    }

    /// Log an audit entry
    pub async fn log(&self, entry: AuditLogEntry) -> LedgerResult<()> {
        let json = serde_json::to_string(&entry).map_err(LedgerError::Serialization)?;

        let mut file = self.file_handle.lock().await;
        writeln!(file, "{}", json)
            .map_err(|e| LedgerError::Message(format!("Failed to write audit log: {}", e)))?;

        file.flush()
            .map_err(|e| LedgerError::Message(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Log duel creation
    pub async fn log_duel_opened(&self, duel: &Duel) -> LedgerResult<()> {
        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: "duel_opened".to_string(),
            duel_id: Some(duel.id),
            actor_id: Some(duel.creator_id),
            details: serde_json::json!({
                "question": duel.question,
                "category": duel.category.as_str(),
                "kind": duel.kind.as_str(),
                "proposed_stake": duel.proposed_stake.to_string(),
                "deadline": duel.deadline.to_string(),
            }),
        };

        self.log(entry).await
    }

    /// Log stake placement
    pub async fn log_stake_placed(
        &self,
        duel_id: Uuid,
        participant_id: Uuid,
        side: Side,
        amount: Decimal,
        pool_total: Decimal,
    ) -> LedgerResult<()> {
        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: "stake_placed".to_string(),
            duel_id: Some(duel_id),
            actor_id: Some(participant_id),
            details: serde_json::json!({
                "side": side.as_str(),
                "amount": amount.to_string(),
                "pool_total": pool_total.to_string(),
            }),
        };

        self.log(entry).await
    }

    /// Log duel resolution
    pub async fn log_duel_resolved(
        &self,
        duel_id: Uuid,
        outcome: Side,
        pool_total: Decimal,
        winner_count: usize,
        resolver_id: Uuid,
    ) -> LedgerResult<()> {
        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: "duel_resolved".to_string(),
            duel_id: Some(duel_id),
            actor_id: Some(resolver_id),
            details: serde_json::json!({
                "outcome": outcome.as_str(),
                "pool_total": pool_total.to_string(),
                "winner_count": winner_count,
            }),
        };

        self.log(entry).await
    }

    /// Log duel cancellation
    pub async fn log_duel_cancelled(&self, duel_id: Uuid, caller_id: Uuid) -> LedgerResult<()> {
        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: "duel_cancelled".to_string(),
            duel_id: Some(duel_id),
            actor_id: Some(caller_id),
            details: serde_json::json!({}),
        };

        self.log(entry).await
    }

    /// Log a settled claim
    pub async fn log_winnings_claimed(
        &self,
        duel_id: Uuid,
        participant_id: Uuid,
        amount: Decimal,
        transaction_signature: &str,
    ) -> LedgerResult<()> {
        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: "winnings_claimed".to_string(),
            duel_id: Some(duel_id),
            actor_id: Some(participant_id),
            details: serde_json::json!({
                "amount": amount.to_string(),
                "transaction_signature": transaction_signature,
            }),
        };

        self.log(entry).await
    }
}
