use crate::api::ApiClient;
use crate::auth;
use crate::cache::TtlCache;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::models::IdentityProof;
use tracing::info;

/// Per-user session state
///
/// Holds everything that would otherwise be ambient: the API client with its
/// token, the response cache, preview mode and the pending identity proof.
pub struct SessionContext {
    config: AppConfig,
    api: ApiClient,
    cache: TtlCache,
    preview_mode: bool,
    wallet_address: Option<String>,
    identity_proof: Option<IdentityProof>,
}

impl SessionContext {
    /// Create a session from configuration
    pub fn new(config: AppConfig) -> Self {
        let api = ApiClient::new(&config.api);
        Self::with_client(config, api)
    }

    /// Create a session around an existing client
    pub fn with_client(config: AppConfig, api: ApiClient) -> Self {
        let cache = TtlCache::new(config.api.cache_ttl());
        let preview_mode = config.preview_mode;
        Self {
            config,
            api,
            cache,
            preview_mode,
            wallet_address: None,
            identity_proof: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// Unauthenticated demo session: proof and settlement checks are skipped
    pub fn is_preview(&self) -> bool {
        self.preview_mode
    }

    pub fn set_preview_mode(&mut self, enabled: bool) {
        self.preview_mode = enabled;
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet_address.as_deref()
    }

    /// Attach a signed-in wallet and its session token
    pub async fn sign_in(&mut self, wallet_address: &str, token: &str) -> AppResult<()> {
        if !auth::is_valid_wallet_address(wallet_address) {
            return Err(AppError::Validation(format!(
                "Invalid wallet address: {}",
                wallet_address
            )));
        }
        self.api.set_auth_token(token).await;
        self.wallet_address = Some(wallet_address.to_lowercase());
        info!("Session signed in for wallet {}", wallet_address);
        Ok(())
    }

    /// Drop credentials, proof and cached responses
    pub async fn sign_out(&mut self) {
        self.api.clear_auth_token().await;
        self.wallet_address = None;
        self.identity_proof = None;
        self.cache.clear_all().await;
    }

    pub fn is_admin(&self) -> bool {
        self.wallet_address
            .as_deref()
            .map(|wallet| auth::is_admin(wallet, &self.config.admin_wallets))
            .unwrap_or(false)
    }

    /// Fail with `Unauthorized` unless the signed-in wallet is an admin
    pub fn require_admin(&self) -> AppResult<()> {
        auth::require_admin(self.wallet_address.as_deref(), &self.config.admin_wallets)
    }

    /// Keep a proof obtained outside the purchase flow (e.g. at sign-in)
    pub fn set_identity_proof(&mut self, proof: IdentityProof) {
        self.identity_proof = Some(proof);
    }

    pub fn has_identity_proof(&self) -> bool {
        self.identity_proof
            .as_ref()
            .map(IdentityProof::is_well_formed)
            .unwrap_or(false)
    }

    /// Consume the stored proof; each proof backs a single attempt
    pub fn take_identity_proof(&mut self) -> Option<IdentityProof> {
        self.identity_proof.take().filter(IdentityProof::is_well_formed)
    }
}
