use super::{IdentityVerifier, PaymentVerifier, WalletProvider};
use crate::error::{AppError, AppResult};
use crate::models::{
    IdentityProof, PaymentInitiated, PaymentRequest, PaymentStatus, PaymentVerification,
    VerificationLevel,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Proof returned by the mock verifier
pub fn sample_proof() -> IdentityProof {
    IdentityProof {
        merkle_root: "0x1234567890abcdef".to_string(),
        nullifier_hash: "0xabcdef1234567890".to_string(),
        proof: "0x00".to_string(),
        verification_level: VerificationLevel::Device,
    }
}

/// Identity verifier with a fixed outcome
pub struct MockIdentityVerifier {
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockIdentityVerifier {
    pub fn succeeding() -> Self {
        Self {
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for MockIdentityVerifier {
    async fn obtain_proof(&self, _action: &str, _signal: &str) -> AppResult<IdentityProof> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(reason) => Err(AppError::VerificationFailed(reason.clone())),
            None => Ok(sample_proof()),
        }
    }
}

/// Wallet that records every payment command
pub struct MockWallet {
    failure: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<PaymentRequest>>,
}

impl MockWallet {
    pub fn succeeding() -> Self {
        Self {
            failure: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::succeeding()
        }
    }

    /// Hold each payment for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn pay(&self, request: &PaymentRequest) -> AppResult<PaymentInitiated> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().await.push(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.failure {
            Some(reason) => Err(AppError::PaymentFailed(reason.clone())),
            None => Ok(PaymentInitiated {
                transaction_id: format!("tx_mock_{}", call),
                reference: request.reference.clone(),
            }),
        }
    }
}

/// Settlement lookup answering from a script of statuses
///
/// Once the script is exhausted the last status keeps being returned.
pub struct MockPaymentVerifier {
    script: Mutex<VecDeque<PaymentStatus>>,
    last: PaymentStatus,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockPaymentVerifier {
    pub fn completing() -> Self {
        Self::with_statuses(vec![PaymentStatus::Completed])
    }

    pub fn with_statuses(statuses: Vec<PaymentStatus>) -> Self {
        let last = statuses.last().copied().unwrap_or(PaymentStatus::Pending);
        Self {
            script: Mutex::new(statuses.into()),
            last,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::with_statuses(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentVerifier for MockPaymentVerifier {
    async fn verify_payment(
        &self,
        transaction_id: &str,
        reference: &str,
    ) -> AppResult<PaymentVerification> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(AppError::PaymentFailed(reason.clone()));
        }

        let status = match self.script.lock().await.pop_front() {
            Some(status) => status,
            None => self.last,
        };

        Ok(PaymentVerification {
            transaction_id: transaction_id.to_string(),
            reference: reference.to_string(),
            status,
            amount: None,
            token: None,
            timestamp: None,
        })
    }
}
