pub mod health_monitor;
pub mod raffle_service;

pub use health_monitor::HealthMonitor;
pub use raffle_service::RaffleService;
