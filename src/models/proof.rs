use serde::{Deserialize, Serialize};

/// Verification tier reported by the personhood provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    Orb,
    Device,
}

impl VerificationLevel {
    /// Convert to wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationLevel::Orb => "orb",
            VerificationLevel::Device => "device",
        }
    }
}

/// Personhood attestation for a single participation attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityProof {
    pub merkle_root: String,
    pub nullifier_hash: String,
    pub proof: String,
    pub verification_level: VerificationLevel,
}

impl IdentityProof {
    /// A proof with any empty component cannot be submitted
    pub fn is_well_formed(&self) -> bool {
        !self.merkle_root.is_empty() && !self.nullifier_hash.is_empty() && !self.proof.is_empty()
    }
}
