pub mod audit;
pub mod claims;
pub mod ledger;
pub mod payout;
pub mod probability;

pub use audit::AuditTrailService;
pub use claims::ClaimTracker;
pub use ledger::{DuelLedger, StakeOutcome};
pub use payout::{PayoutCalculator, PayoutSheet};
pub use probability::ProbabilityTracker;
