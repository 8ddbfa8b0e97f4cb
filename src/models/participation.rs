use super::proof::IdentityProof;
use serde::{Deserialize, Serialize};

/// Proof section of the participation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofPayload {
    pub nullifier_hash: String,
    pub merkle_root: String,
    pub proof: String,
    pub verification_level: String,
}

impl From<&IdentityProof> for ProofPayload {
    fn from(proof: &IdentityProof) -> Self {
        Self {
            nullifier_hash: proof.nullifier_hash.clone(),
            merkle_root: proof.merkle_root.clone(),
            proof: proof.proof.clone(),
            verification_level: proof.verification_level.as_str().to_string(),
        }
    }
}

/// Body of `POST /sorteos/participar`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipationRequest {
    #[serde(rename = "raffleId")]
    pub raffle_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_elegido: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cantidad_numeros: Option<u32>,
    pub proof: ProofPayload,
    pub action: String,
}

/// Response of `POST /sorteos/participar`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipationResponse {
    #[serde(rename = "mensaje")]
    pub message: String,
    #[serde(rename = "numeros_asignados")]
    pub assigned_numbers: Vec<u32>,
    pub nullifier_hash_masked: String,
}
