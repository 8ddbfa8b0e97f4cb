//! WinTrust Client Library
//!
//! Client-side pipeline for the WinTrust raffle platform: backend access,
//! number availability, selection and purchase confirmation.

pub mod api;
pub mod auth;
pub mod availability;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod purchase;
pub mod selection;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use api::{ApiClient, ApiResponse, RetryPolicy};
pub use availability::Availability;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use purchase::{PurchaseFlow, PurchaseReceipt, PurchaseState};
pub use selection::Selection;
pub use session::SessionContext;
