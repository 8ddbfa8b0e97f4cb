use crate::api::ApiClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{info, warn};

/// Background task that tracks whether the raffle backend is reachable
pub struct HealthMonitor {
    api: ApiClient,
    available: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl HealthMonitor {
    /// Create a new monitor, polling every 30 seconds
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            available: Arc::new(AtomicBool::new(false)),
            poll_interval: Duration::from_secs(30),
        }
    }

    /// Set poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Shared flag readers can keep after the monitor is moved into a task
    pub fn handle(&self) -> Arc<AtomicBool> {
        self.available.clone()
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Probe the backend once and record the result
    pub async fn check_once(&self) -> bool {
        let now = self.api.health_check().await;
        let before = self.available.swap(now, Ordering::AcqRel);

        if now != before {
            if now {
                info!("Raffle backend reachable at {}", self.api.base_url());
            } else {
                warn!("Raffle backend unreachable at {}", self.api.base_url());
            }
        }

        now
    }

    /// Start polling
    pub async fn start(self) {
        let mut interval = time::interval(self.poll_interval);
        info!("Health monitor started, polling every {:?}", self.poll_interval);

        loop {
            interval.tick().await;
            self.check_once().await;
        }
    }
}
