use std::env;
use std::time::Duration;

/// Backend API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_multiplier: u32,
    pub cache_ttl_secs: u64,
}

/// Wallet payment configuration
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub app_id: String,
    pub recipient: String,
    pub token_symbol: String,
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub payment: PaymentConfig,
    pub admin_wallets: Vec<String>,
    pub preview_mode: bool,
    pub log_level: String,
    pub environment: String,
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

impl ApiConfig {
    /// Create API config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("API_URL")
            .map_err(|_| "API_URL environment variable is required")?
            .trim_end_matches('/')
            .to_string();

        let timeout_ms = parse_var("API_TIMEOUT_MS", 8000);
        let max_retries = parse_var("API_MAX_RETRIES", 3);
        let retry_base_delay_ms = parse_var("API_RETRY_BASE_DELAY_MS", 1000);
        let retry_multiplier = parse_var("API_RETRY_MULTIPLIER", 2);
        let cache_ttl_secs = parse_var("CACHE_TTL_SECS", 300); // 5 minutes

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(format!("API_URL must be an http(s) URL, got: {}", base_url));
        }

        if timeout_ms == 0 {
            return Err("API_TIMEOUT_MS must be greater than 0".to_string());
        }

        if retry_multiplier == 0 {
            return Err("API_RETRY_MULTIPLIER must be greater than 0".to_string());
        }

        Ok(Self {
            base_url,
            timeout_ms,
            max_retries,
            retry_base_delay_ms,
            retry_multiplier,
            cache_ttl_secs,
        })
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get first retry delay as Duration
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Get cache TTL as Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            timeout_ms: 8000,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            retry_multiplier: 2,
            cache_ttl_secs: 300,
        }
    }
}

impl PaymentConfig {
    /// Create payment config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_id = env::var("APP_ID").unwrap_or_default();
        let recipient = env::var("PAYMENT_RECIPIENT").unwrap_or_default();
        let token_symbol = env::var("PAYMENT_TOKEN")
            .unwrap_or_else(|_| "WLD".to_string())
            .to_uppercase();
        let poll_attempts = parse_var("PAYMENT_POLL_ATTEMPTS", 5);
        let poll_interval_ms = parse_var("PAYMENT_POLL_INTERVAL_MS", 2000);

        if poll_attempts == 0 {
            return Err("PAYMENT_POLL_ATTEMPTS must be greater than 0".to_string());
        }

        if !recipient.is_empty() && !crate::auth::is_valid_wallet_address(&recipient) {
            return Err(format!("Invalid PAYMENT_RECIPIENT: {}", recipient));
        }

        Ok(Self {
            app_id,
            recipient,
            token_symbol,
            poll_attempts,
            poll_interval_ms,
        })
    }

    /// Get verification poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            recipient: String::new(),
            token_symbol: "WLD".to_string(),
            poll_attempts: 5,
            poll_interval_ms: 2000,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let api = ApiConfig::from_env()?;
        let payment = PaymentConfig::from_env()?;

        let admin_wallets: Vec<String> = env::var("ADMIN_WALLETS")
            .unwrap_or_default()
            .split(',')
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let preview_mode = parse_var("PREVIEW_MODE", false);

        let log_level = env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string());

        let environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string());

        for wallet in &admin_wallets {
            if !crate::auth::is_valid_wallet_address(wallet) {
                return Err(format!("Invalid wallet in ADMIN_WALLETS: {}", wallet));
            }
        }

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        if !preview_mode && payment.recipient.is_empty() {
            return Err("PAYMENT_RECIPIENT is required unless PREVIEW_MODE is enabled".to_string());
        }

        if preview_mode && environment.to_lowercase() == "production" {
            return Err("PREVIEW_MODE cannot be enabled in production".to_string());
        }

        Ok(Self {
            api,
            payment,
            admin_wallets,
            preview_mode,
            log_level: log_level.to_lowercase(),
            environment: environment.to_lowercase(),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Get API base URL (convenience method)
    pub fn api_url(&self) -> &str {
        &self.api.base_url
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            payment: PaymentConfig::default(),
            admin_wallets: Vec::new(),
            preview_mode: false,
            log_level: "info".to_string(),
            environment: "development".to_string(),
        }
    }
}
