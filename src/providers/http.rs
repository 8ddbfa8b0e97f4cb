use super::{IdentityVerifier, PaymentVerifier, WalletProvider};
use crate::api::{endpoint, ApiClient};
use crate::error::{AppError, AppResult};
use crate::models::{IdentityProof, PaymentInitiated, PaymentRequest, PaymentVerification};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct VerifyProofResponse {
    #[serde(rename = "verifyRes")]
    verify_res: VerifyResult,
}

#[derive(Debug, Deserialize)]
struct VerifyResult {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Validates host-supplied proofs through `POST /api/verify-proof`
///
/// The wallet app produces the raw proof; the host hands it over with
/// [`BackendIdentityVerifier::submit`] before the flow asks for it.
pub struct BackendIdentityVerifier {
    api: ApiClient,
    pending: Mutex<Option<IdentityProof>>,
}

impl BackendIdentityVerifier {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            pending: Mutex::new(None),
        }
    }

    /// Store the proof produced by the wallet app
    pub async fn submit(&self, proof: IdentityProof) {
        *self.pending.lock().await = Some(proof);
    }
}

#[async_trait]
impl IdentityVerifier for BackendIdentityVerifier {
    async fn obtain_proof(&self, action: &str, signal: &str) -> AppResult<IdentityProof> {
        let proof = self
            .pending
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::VerificationFailed("No proof supplied by wallet".to_string()))?;

        if !proof.is_well_formed() {
            return Err(AppError::VerificationFailed("Proof is incomplete".to_string()));
        }

        let body = json!({ "payload": proof, "action": action, "signal": signal });
        let response = self
            .api
            .post::<VerifyProofResponse, _>("/api/verify-proof", &body)
            .await
            .into_result()
            .map_err(|e| AppError::VerificationFailed(e.to_string()))?;

        if response.verify_res.success {
            info!("Identity proof accepted for action {}", action);
            Ok(proof)
        } else {
            let reason = response
                .verify_res
                .error
                .unwrap_or_else(|| "Proof rejected".to_string());
            warn!("Identity proof rejected for action {}: {}", action, reason);
            Err(AppError::VerificationFailed(reason))
        }
    }
}

#[derive(Debug, Deserialize)]
struct InitiatePaymentResponse {
    #[serde(alias = "id")]
    transaction_id: String,
}

/// Sends the payment command through `POST /api/initiate-payment`
pub struct BackendWallet {
    api: ApiClient,
}

impl BackendWallet {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl WalletProvider for BackendWallet {
    async fn pay(&self, request: &PaymentRequest) -> AppResult<PaymentInitiated> {
        let response = self
            .api
            .post::<InitiatePaymentResponse, _>("/api/initiate-payment", request)
            .await
            .into_result()
            .map_err(|e| AppError::PaymentFailed(e.to_string()))?;

        Ok(PaymentInitiated {
            transaction_id: response.transaction_id,
            reference: request.reference.clone(),
        })
    }
}

/// Queries `GET /api/verify-payment/{transactionId}?reference=...`
pub struct BackendPaymentVerifier {
    api: ApiClient,
}

impl BackendPaymentVerifier {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PaymentVerifier for BackendPaymentVerifier {
    async fn verify_payment(
        &self,
        transaction_id: &str,
        reference: &str,
    ) -> AppResult<PaymentVerification> {
        let path = endpoint(
            &["api", "verify-payment", transaction_id],
            &[("reference", reference)],
        )?;
        let verification = self
            .api
            .get::<PaymentVerification>(&path)
            .await
            .into_result()?;

        if verification.reference != reference {
            return Err(AppError::PaymentFailed(format!(
                "Reference mismatch: expected {}, got {}",
                reference, verification.reference
            )));
        }

        Ok(verification)
    }
}
