//! Capabilities the purchase flow depends on.
//!
//! Each capability has a backend-backed implementation in [`http`] and a
//! deterministic double in [`mock`]; callers pick one when building the flow.

pub mod http;
pub mod mock;

use crate::error::AppResult;
use crate::models::{IdentityProof, PaymentInitiated, PaymentRequest, PaymentVerification};
use async_trait::async_trait;

/// Source of personhood attestations
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Obtain a proof bound to `action` and `signal`
    async fn obtain_proof(&self, action: &str, signal: &str) -> AppResult<IdentityProof>;
}

/// Wallet able to send a token payment
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn pay(&self, request: &PaymentRequest) -> AppResult<PaymentInitiated>;
}

/// Settlement status lookup for an initiated payment
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify_payment(
        &self,
        transaction_id: &str,
        reference: &str,
    ) -> AppResult<PaymentVerification>;
}

pub use http::{BackendIdentityVerifier, BackendPaymentVerifier, BackendWallet};
pub use mock::{MockIdentityVerifier, MockPaymentVerifier, MockWallet};
