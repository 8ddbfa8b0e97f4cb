use thiserror::Error;

/// Client-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Connection could not be established or was dropped
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// 5xx or 408 response (retried before being surfaced)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Non-retryable 4xx response
    #[error("Request rejected ({status}): {message}")]
    Client { status: u16, message: String },

    /// Identity proof rejected or absent
    #[error("Identity verification failed: {0}")]
    VerificationFailed(String),

    /// Payment initiation or settlement did not complete
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// Fewer (or more) numbers chosen than required
    #[error("Selection incomplete: {selected} of {required} numbers chosen")]
    SelectionIncomplete { selected: usize, required: usize },

    /// A purchase is already being submitted for this flow
    #[error("A purchase is already in progress")]
    PurchaseInProgress,

    /// Unauthorized access errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for client errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Whether the API client should retry after this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Network(_) | AppError::Timeout(_) | AppError::Server { .. }
        )
    }

    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Client { status: 404, .. })
    }

    /// HTTP status associated with the error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Server { status, .. } | AppError::Client { status, .. } => *status,
            AppError::Timeout(_) => 408,
            AppError::Unauthorized(_) => 401,
            AppError::Validation(_) | AppError::SelectionIncomplete { .. } => 400,
            AppError::PurchaseInProgress => 409,
            AppError::VerificationFailed(_) => 403,
            AppError::PaymentFailed(_) => 402,
            _ => 500,
        }
    }

    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            AppError::Client { message, .. } | AppError::Server { message, .. } => message.clone(),
            AppError::Network(_) | AppError::Timeout(_) => {
                "Could not reach the raffle service, please try again".to_string()
            }
            AppError::VerificationFailed(_) => "Identity verification failed".to_string(),
            AppError::PaymentFailed(_) => "Transaction failed".to_string(),
            AppError::SelectionIncomplete { required, .. } => {
                format!("Select {} number(s) before confirming", required)
            }
            AppError::PurchaseInProgress => "Your purchase is being processed".to_string(),
            AppError::Unauthorized(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Serialization(_) | AppError::Config(_) | AppError::Message(_) => {
                "Unknown error".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Message(format!("Malformed response: {}", err))
        } else {
            AppError::Network(err.to_string())
        }
    }
}
