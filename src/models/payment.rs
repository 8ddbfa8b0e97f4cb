use serde::{Deserialize, Serialize};

/// Token line of a wallet payment command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub symbol: String,
    /// Decimal amount rendered as a string so no precision is lost on the wire
    pub token_amount: String,
}

/// Wallet payment command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub reference: String,
    pub recipient: String,
    pub tokens: Vec<TokenAmount>,
    pub description: String,
}

/// Result of a successful payment initiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInitiated {
    pub transaction_id: String,
    pub reference: String,
}

/// Settlement status of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    /// Parse from wire string; unknown values are treated as still pending
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "completed" | "mined" => PaymentStatus::Completed,
            "failed" | "error" => PaymentStatus::Failed,
            "cancelled" | "canceled" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Pending,
        }
    }

    /// Convert to wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    /// Whether polling can stop
    pub fn is_final(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

/// Response of `GET /api/verify-payment/{transactionId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub transaction_id: String,
    pub reference: String,
    #[serde(deserialize_with = "deserialize_status")]
    pub status: PaymentStatus,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<PaymentStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(PaymentStatus::from_str(&raw))
}
