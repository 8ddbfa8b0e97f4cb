//! HTTP access to the raffle backend.

pub mod client;
pub mod retry;

pub use client::{endpoint, ApiClient, ApiResponse};
pub use reqwest::Method;
pub use retry::RetryPolicy;
