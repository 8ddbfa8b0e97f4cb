//! Wire models for the raffle backend.
//!
//! Field names follow the backend's JSON (Spanish) through serde renames;
//! the Rust side uses English names.

pub mod participation;
pub mod payment;
pub mod proof;
pub mod raffle;

// Re-export all models for convenient access
pub use participation::{ParticipationRequest, ParticipationResponse, ProofPayload};
pub use payment::{PaymentInitiated, PaymentRequest, PaymentStatus, PaymentVerification, TokenAmount};
pub use proof::{IdentityProof, VerificationLevel};
pub use raffle::{
    NewRaffle, Prize, Raffle, RaffleConfig, RaffleKind, RaffleStatus, RaffleStatusDetail,
    UserNotification, Winner, WinnerSummary,
};
