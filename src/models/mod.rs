//! Domain models for the duel ledger.
//!
//! This module contains the store-backed models representing
//! the core entities of the wagering ledger.

pub mod duel;
pub mod participant;
pub mod probability;

// Re-export all models for convenient access
pub use duel::{Duel, DuelCategory, DuelKind, DuelStatus, Side};
pub use participant::ParticipantStake;
pub use probability::ProbabilitySample;
