use rust_decimal::Decimal;
use std::env;

/// Ledger configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Smallest stake accepted, in pool currency units
    pub min_stake: Decimal,
    /// Maximum duel question length in bytes
    pub max_question_len: usize,
    /// Probability movement (percentage points) required to record a new sample
    pub sample_epsilon_pct: Decimal,
    /// Bounded internal retries for optimistic write conflicts
    pub max_write_retries: u32,
}

impl LedgerConfig {
    /// Create ledger config from environment variables
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let min_stake = env::var("LEDGER_MIN_STAKE")
            .ok()
            .and_then(|s| s.parse::<Decimal>().ok())
            .unwrap_or_else(|| Decimal::new(1, 2)); // 0.01

        let max_question_len = env::var("LEDGER_MAX_QUESTION_LEN")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(200);

        let sample_epsilon_pct = env::var("LEDGER_SAMPLE_EPSILON_PCT")
            .ok()
            .and_then(|s| s.parse::<Decimal>().ok())
            .unwrap_or_else(|| Decimal::new(1, 1)); // 0.1 percentage points

        let max_write_retries = env::var("LEDGER_MAX_WRITE_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(5);

        // Validate configuration
        if min_stake <= Decimal::ZERO {
            return Err("LEDGER_MIN_STAKE must be greater than 0".to_string());
        }

        if max_question_len == 0 {
            return Err("LEDGER_MAX_QUESTION_LEN must be greater than 0".to_string());
        }

        if sample_epsilon_pct < Decimal::ZERO {
            return Err("LEDGER_SAMPLE_EPSILON_PCT must not be negative".to_string());
        }

        if max_write_retries == 0 {
            return Err("LEDGER_MAX_WRITE_RETRIES must be greater than 0".to_string());
        }

        Ok(Self {
            min_stake,
            max_question_len,
            sample_epsilon_pct,
            max_write_retries,
        })
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_stake: Decimal::new(1, 2),
            max_question_len: 200,
            sample_epsilon_pct: Decimal::new(1, 1),
            max_write_retries: 5,
        }
    }
}
