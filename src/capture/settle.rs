//! Strategies for waiting until the page has settled

use std::time::Duration;

use crate::config::CaptureConfig;

/// Which change the page is settling from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePhase {
    /// After a scroll request; layout, paint and lazy content
    Scroll,
    /// After fixed chrome was hidden or shown
    ChromeToggle,
    /// After the tool's overlay was hidden, right before capturing
    OverlayHidden,
}

/// Wait until the next frame is stable enough to capture
#[allow(async_fn_in_trait)]
pub trait StableFrame {
    async fn wait_for_stable_frame(&mut self, phase: SettlePhase);
}

/// Sleep for a fixed interval per phase
#[derive(Debug, Clone)]
pub struct FixedDelay {
    pub scroll: Duration,
    pub chrome_toggle: Duration,
    pub overlay_hidden: Duration,
}

impl FixedDelay {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            scroll: Duration::from_millis(config.settle_delay_ms),
            chrome_toggle: Duration::from_millis(config.chrome_toggle_delay_ms),
            overlay_hidden: Duration::from_millis(config.overlay_hide_delay_ms),
        }
    }

    fn delay(&self, phase: SettlePhase) -> Duration {
        match phase {
            SettlePhase::Scroll => self.scroll,
            SettlePhase::ChromeToggle => self.chrome_toggle,
            SettlePhase::OverlayHidden => self.overlay_hidden,
        }
    }
}

impl StableFrame for FixedDelay {
    async fn wait_for_stable_frame(&mut self, phase: SettlePhase) {
        let delay = self.delay(phase);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// No waiting at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl StableFrame for Immediate {
    async fn wait_for_stable_frame(&mut self, _phase: SettlePhase) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fixed_delay_sleeps_per_phase() {
        let mut settle = FixedDelay::from_config(&CaptureConfig::default());
        let start = tokio::time::Instant::now();
        settle.wait_for_stable_frame(SettlePhase::Scroll).await;
        assert_eq!(start.elapsed(), Duration::from_millis(800));
        settle.wait_for_stable_frame(SettlePhase::OverlayHidden).await;
        assert_eq!(start.elapsed(), Duration::from_millis(850));
    }
}
