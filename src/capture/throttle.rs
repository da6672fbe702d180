//! Minimum spacing between capture primitive calls

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CaptureThrottle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl CaptureThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Wait until a capture call is allowed, then record it
    pub async fn ready(&mut self) {
        if let Some(last) = self.last {
            let next = last + self.min_interval;
            if Instant::now() < next {
                log::debug!("Throttling capture for {:?}", next - Instant::now());
                tokio::time::sleep_until(next).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
