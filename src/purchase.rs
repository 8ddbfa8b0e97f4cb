//! Purchase confirmation: proof, then payment, then settlement check.

use crate::availability::format_number;
use crate::error::{AppError, AppResult};
use crate::models::{
    IdentityProof, ParticipationRequest, PaymentRequest, PaymentStatus, ProofPayload, Raffle,
    TokenAmount,
};
use crate::providers::{
    BackendIdentityVerifier, BackendPaymentVerifier, BackendWallet, IdentityVerifier,
    MockIdentityVerifier, MockPaymentVerifier, MockWallet, PaymentVerifier, WalletProvider,
};
use crate::selection::Selection;
use crate::session::SessionContext;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Default action name registered with the identity provider
pub const DEFAULT_ACTION: &str = "participar-sorteo";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Purchase flow states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseState {
    Idle,
    ProofPending,
    ProofObtained,
    PaymentPending,
    PaymentInitiated,
    VerificationPending,
    Completed,
    Failed,
}

impl PurchaseState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseState::Completed | PurchaseState::Failed)
    }

    /// Money may have left the wallet in these states
    pub fn has_payment_in_flight(&self) -> bool {
        matches!(
            self,
            PurchaseState::PaymentInitiated | PurchaseState::VerificationPending
        )
    }
}

/// Outcome of a completed purchase, handed to the navigation layer
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub raffle_id: String,
    /// Display labels of the purchased numbers
    pub numbers: Vec<String>,
    pub reference: String,
    pub transaction_id: String,
    pub total_cost: Decimal,
    pub token_symbol: String,
    /// `None` in preview mode
    pub proof: Option<IdentityProof>,
}

impl PurchaseReceipt {
    /// Build the `/sorteos/participar` body for this purchase
    pub fn participation_request(&self, action: &str) -> Option<ParticipationRequest> {
        let proof = self.proof.as_ref()?;
        let numbers: Vec<u32> = self
            .numbers
            .iter()
            .filter_map(|label| crate::availability::parse_label(label))
            .collect();

        Some(ParticipationRequest {
            raffle_id: self.raffle_id.clone(),
            numero_elegido: if numbers.len() == 1 { numbers.first().copied() } else { None },
            cantidad_numeros: Some(numbers.len() as u32),
            proof: ProofPayload::from(proof),
            action: action.to_string(),
        })
    }
}

/// Generate `raffle_<raffleId>_<unixMillis>_<7 base36 chars>`
pub fn generate_reference(raffle_id: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..7)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("raffle_{}_{}_{}", raffle_id, Utc::now().timestamp_millis(), suffix)
}

/// Single in-flight purchase orchestration for one session
pub struct PurchaseFlow {
    identity: Arc<dyn IdentityVerifier>,
    wallet: Arc<dyn WalletProvider>,
    verifier: Arc<dyn PaymentVerifier>,
    action: String,
    state: Mutex<PurchaseState>,
    submitting: AtomicBool,
    pending_reference: Mutex<Option<String>>,
}

/// Releases the submitting flag when a confirmation ends or is dropped
struct SubmitGuard<'a> {
    flow: &'a PurchaseFlow,
}

impl<'a> SubmitGuard<'a> {
    fn acquire(flow: &'a PurchaseFlow) -> AppResult<Self> {
        flow.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::PurchaseInProgress)?;
        Ok(Self { flow })
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        let state = self.flow.state();
        if !state.is_terminal() && state != PurchaseState::Idle {
            // Confirmation future dropped mid-flight: the result is discarded
            let reference = lock(&self.flow.pending_reference).take();
            if state.has_payment_in_flight() {
                warn!(
                    "Purchase abandoned in {:?} with payment reference {:?}, needs reconciliation",
                    state, reference
                );
            } else {
                info!("Purchase abandoned in {:?} before payment", state);
            }
            *lock(&self.flow.state) = PurchaseState::Failed;
        }
        self.flow.submitting.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl PurchaseFlow {
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        wallet: Arc<dyn WalletProvider>,
        verifier: Arc<dyn PaymentVerifier>,
    ) -> Self {
        Self {
            identity,
            wallet,
            verifier,
            action: DEFAULT_ACTION.to_string(),
            state: Mutex::new(PurchaseState::Idle),
            submitting: AtomicBool::new(false),
            pending_reference: Mutex::new(None),
        }
    }

    /// Build a flow wired for `session`
    ///
    /// Preview sessions get the deterministic providers. Live sessions talk to
    /// the backend and must already hold an identity proof and a payment
    /// recipient, so a misconfigured purchase fails before anything is sent.
    pub fn for_session(session: &SessionContext) -> AppResult<Self> {
        if session.is_preview() {
            return Ok(Self::new(
                Arc::new(MockIdentityVerifier::succeeding()),
                Arc::new(MockWallet::succeeding()),
                Arc::new(MockPaymentVerifier::completing()),
            ));
        }

        if !session.has_identity_proof() {
            return Err(AppError::VerificationFailed(
                "No identity proof supplied for this session".to_string(),
            ));
        }
        if session.config().payment.recipient.is_empty() {
            return Err(AppError::Config(
                "No payment recipient configured".to_string(),
            ));
        }

        let api = session.api().clone();
        Ok(Self::new(
            Arc::new(BackendIdentityVerifier::new(api.clone())),
            Arc::new(BackendWallet::new(api.clone())),
            Arc::new(BackendPaymentVerifier::new(api)),
        ))
    }

    /// Override the identity action name
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn state(&self) -> PurchaseState {
        *lock(&self.state)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    fn transition(&self, next: PurchaseState) {
        let mut state = lock(&self.state);
        debug!("Purchase state {:?} -> {:?}", *state, next);
        *state = next;
    }

    /// Confirm the purchase of the selected numbers
    ///
    /// Refuses to start unless the selection holds exactly the required
    /// quantity. On success the selection is cleared; on failure it is left
    /// intact so the user can retry.
    pub async fn confirm(
        &self,
        session: &mut SessionContext,
        raffle: &Raffle,
        selection: &mut Selection,
    ) -> AppResult<PurchaseReceipt> {
        if selection.quantity() == 0 || !selection.is_complete() {
            return Err(AppError::SelectionIncomplete {
                selected: selection.len(),
                required: selection.quantity(),
            });
        }

        let _guard = SubmitGuard::acquire(self)?;

        self.check_entry(session, raffle, selection)?;
        self.transition(PurchaseState::Idle);

        match self.run(session, raffle, selection).await {
            Ok(receipt) => {
                self.transition(PurchaseState::Completed);
                *lock(&self.pending_reference) = None;
                selection.clear();
                info!(
                    "Purchase completed for raffle {}: numbers {:?}, reference {}",
                    receipt.raffle_id, receipt.numbers, receipt.reference
                );
                Ok(receipt)
            }
            Err(e) => {
                self.transition(PurchaseState::Failed);
                *lock(&self.pending_reference) = None;
                error!("Purchase failed for raffle {}: {}", raffle.id, e);
                Err(e)
            }
        }
    }

    fn check_entry(
        &self,
        session: &SessionContext,
        raffle: &Raffle,
        selection: &Selection,
    ) -> AppResult<()> {
        if !session.is_preview() && session.config().payment.recipient.is_empty() {
            return Err(AppError::Config(
                "No payment recipient configured".to_string(),
            ));
        }

        if selection.raffle_id() != raffle.id {
            return Err(AppError::Validation(format!(
                "Selection belongs to raffle {}, not {}",
                selection.raffle_id(),
                raffle.id
            )));
        }

        if !raffle.is_active() {
            return Err(AppError::Validation(format!(
                "Raffle {} is not open for sale ({})",
                raffle.id,
                raffle.status().as_str()
            )));
        }

        let availability = raffle.availability();
        if let Some(taken) = selection
            .numbers()
            .iter()
            .find(|n| !availability.is_available(**n))
        {
            return Err(AppError::Validation(format!(
                "Number {} is no longer available",
                format_number(*taken)
            )));
        }

        Ok(())
    }

    async fn run(
        &self,
        session: &mut SessionContext,
        raffle: &Raffle,
        selection: &Selection,
    ) -> AppResult<PurchaseReceipt> {
        let preview = session.is_preview();

        // Step 1: identity proof
        self.transition(PurchaseState::ProofPending);
        let proof = if preview {
            debug!("Preview mode, skipping identity proof");
            None
        } else {
            match session.take_identity_proof() {
                Some(proof) => Some(proof),
                None => {
                    let signal = session
                        .wallet_address()
                        .unwrap_or(raffle.id.as_str())
                        .to_string();
                    let proof = self
                        .identity
                        .obtain_proof(&self.action, &signal)
                        .await
                        .map_err(into_verification_failure)?;
                    Some(proof)
                }
            }
        };
        self.transition(PurchaseState::ProofObtained);

        // Step 2: payment initiation
        self.transition(PurchaseState::PaymentPending);
        let payment_config = &session.config().payment;
        let total_cost = raffle.total_cost(selection.len());
        let reference = generate_reference(&raffle.id);
        let request = PaymentRequest {
            reference: reference.clone(),
            recipient: payment_config.recipient.clone(),
            tokens: vec![TokenAmount {
                symbol: payment_config.token_symbol.clone(),
                token_amount: total_cost.normalize().to_string(),
            }],
            description: format!(
                "Purchase of {} number(s) for raffle: {}",
                selection.len(),
                raffle.name
            ),
        };

        *lock(&self.pending_reference) = Some(reference.clone());
        let initiated = self
            .wallet
            .pay(&request)
            .await
            .map_err(into_payment_failure)?;
        self.transition(PurchaseState::PaymentInitiated);
        info!(
            "Payment {} initiated for raffle {} ({} {})",
            initiated.transaction_id, raffle.id, total_cost, payment_config.token_symbol
        );

        // Step 3: settlement
        self.transition(PurchaseState::VerificationPending);
        if preview {
            debug!("Preview mode, treating payment {} as completed", initiated.transaction_id);
        } else {
            self.await_settlement(
                &initiated.transaction_id,
                &reference,
                payment_config.poll_attempts,
                payment_config.poll_interval(),
            )
            .await?;
        }

        Ok(PurchaseReceipt {
            raffle_id: raffle.id.clone(),
            numbers: selection.labels(),
            reference,
            transaction_id: initiated.transaction_id,
            total_cost,
            token_symbol: payment_config.token_symbol.clone(),
            proof,
        })
    }

    async fn await_settlement(
        &self,
        transaction_id: &str,
        reference: &str,
        attempts: u32,
        interval: std::time::Duration,
    ) -> AppResult<()> {
        for attempt in 1..=attempts.max(1) {
            let verification = self
                .verifier
                .verify_payment(transaction_id, reference)
                .await
                .map_err(into_payment_failure)?;

            match verification.status {
                PaymentStatus::Completed => return Ok(()),
                PaymentStatus::Pending => {
                    debug!(
                        "Payment {} pending (check {}/{})",
                        transaction_id, attempt, attempts
                    );
                    if attempt < attempts {
                        tokio::time::sleep(interval).await;
                    }
                }
                status => {
                    return Err(AppError::PaymentFailed(format!(
                        "Payment {} ended as {}",
                        transaction_id,
                        status.as_str()
                    )));
                }
            }
        }

        Err(AppError::PaymentFailed(format!(
            "Payment {} still pending after {} checks",
            transaction_id, attempts
        )))
    }
}

fn into_verification_failure(err: AppError) -> AppError {
    match err {
        AppError::VerificationFailed(_) => err,
        other => AppError::VerificationFailed(other.to_string()),
    }
}

fn into_payment_failure(err: AppError) -> AppError {
    match err {
        AppError::PaymentFailed(_) => err,
        other => AppError::PaymentFailed(other.to_string()),
    }
}
