use crate::error::{AppError, AppResult};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Check that a wallet address is `0x` followed by 20 hex-encoded bytes
pub fn is_valid_wallet_address(address: &str) -> bool {
    match address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) {
        Some(body) => body.len() == 40 && hex::decode(body).is_ok(),
        None => false,
    }
}

/// Check whether a wallet is on the admin allowlist
///
/// Comparison is case-insensitive since checksummed and lowercase
/// addresses refer to the same account.
pub fn is_admin(wallet_address: &str, allowlist: &[String]) -> bool {
    if !is_valid_wallet_address(wallet_address) {
        return false;
    }
    allowlist
        .iter()
        .any(|admin| admin.eq_ignore_ascii_case(wallet_address))
}

/// Require an admin wallet, returning `Unauthorized` otherwise
pub fn require_admin(wallet_address: Option<&str>, allowlist: &[String]) -> AppResult<()> {
    match wallet_address {
        Some(wallet) if is_admin(wallet, allowlist) => Ok(()),
        Some(wallet) => Err(AppError::Unauthorized(format!(
            "Wallet {} is not an administrator",
            wallet
        ))),
        None => Err(AppError::Unauthorized("Missing wallet address".to_string())),
    }
}

/// Generate a random alphanumeric nonce for wallet sign-in
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Mask a nullifier hash for display, keeping the first and last 6 characters
pub fn mask_nullifier(nullifier_hash: &str) -> String {
    let chars: Vec<char> = nullifier_hash.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{}...{}", head, tail)
}
