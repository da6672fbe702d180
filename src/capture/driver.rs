//! Capture step state machine
//!
//! Walks the scroll range in viewport-sized steps. Each step scrolls, waits
//! for the page to settle, reads back the offset the page really reached and
//! captures the viewport. The scroll position, fixed chrome visibility and
//! the tool overlay are borrowed for the run and put back on every exit path.

use crate::config::CaptureConfig;
use crate::domain::{Bitmap, CaptureError, CaptureStep, ScrollTarget};
use crate::page::{FixedChromeSet, PageStateHandle};

use super::{CancelFlag, CapturePrimitive, CaptureThrottle, SettlePhase, StableFrame};

pub struct CaptureDriver<'a, P: ?Sized, C: ?Sized, S> {
    page: &'a mut P,
    camera: &'a mut C,
    settle: S,
    throttle: CaptureThrottle,
    config: CaptureConfig,
    cancel: CancelFlag,
    progress: Option<Box<dyn FnMut(u8) + 'a>>,
}

impl<'a, P, C, S> CaptureDriver<'a, P, C, S>
where
    P: PageStateHandle + ?Sized,
    C: CapturePrimitive + ?Sized,
    S: StableFrame,
{
    pub fn new(page: &'a mut P, camera: &'a mut C, settle: S, config: &CaptureConfig) -> Self {
        Self {
            page,
            camera,
            settle,
            throttle: CaptureThrottle::new(std::time::Duration::from_millis(
                config.min_capture_interval_ms,
            )),
            config: config.clone(),
            cancel: CancelFlag::new(),
            progress: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Called with a 0-99 percentage after every step
    pub fn on_progress(mut self, progress: impl FnMut(u8) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Capture every step of `target`, in scroll order
    ///
    /// On error nothing is returned; the page is restored either way.
    pub async fn run(&mut self, target: &ScrollTarget) -> Result<Vec<CaptureStep>, CaptureError> {
        log::info!(
            "Capturing {}: content {}px, viewport {}px",
            if target.is_document() { "document" } else { "inner scroller" },
            target.content_height,
            target.viewport_height
        );
        let snapshot = self.page.save(target.container);
        let mut chrome = FixedChromeSet::capture(&*self.page, target.container);

        let result = self.sweep(target, &mut chrome).await;

        chrome.set_hidden(&mut *self.page, false);
        self.page.set_tool_overlay_hidden(false);
        self.page.restore(&snapshot);

        match &result {
            Ok(steps) => log::info!("Captured {} steps", steps.len()),
            Err(err) => log::warn!("Capture run aborted: {err}"),
        }
        result
    }

    /// Capture only the visible viewport, without scrolling
    pub async fn capture_viewport(&mut self) -> Result<Bitmap, CaptureError> {
        if self.cancel.is_cancelled() {
            return Err(CaptureError::Cancelled);
        }
        self.capture_frame().await
    }

    async fn sweep(
        &mut self,
        target: &ScrollTarget,
        chrome: &mut FixedChromeSet,
    ) -> Result<Vec<CaptureStep>, CaptureError> {
        let viewport = target.viewport_height;
        let content = target.content_height;
        let mut current = 0.0_f64;
        let mut steps = Vec::new();
        let step_limit = step_limit(content, viewport, self.config.extra_steps);

        loop {
            if self.cancel.is_cancelled() {
                return Err(CaptureError::Cancelled);
            }
            if steps.len() >= step_limit {
                return Err(CaptureError::CompositionIncomplete(format!(
                    "page bottom not reached after {step_limit} steps"
                )));
            }

            let mut requested = current;
            let is_final = current + viewport >= content;
            if is_final {
                // Ask for the real bottom, the estimate may be stale
                requested = self.page.scroll_height(target.container);
            }

            let hide_chrome = current > 0.0;
            if hide_chrome != chrome.is_hidden() {
                chrome.set_hidden(&mut *self.page, hide_chrome);
                self.settle
                    .wait_for_stable_frame(SettlePhase::ChromeToggle)
                    .await;
            }

            self.page.scroll_to(target.container, requested);
            self.settle.wait_for_stable_frame(SettlePhase::Scroll).await;
            let actual = self.page.scroll_offset(target.container);
            log::debug!("Target: {requested}, Actual: {actual}");

            let bitmap = self.capture_frame().await?;
            steps.push(CaptureStep {
                requested_offset: requested,
                actual_offset: actual,
                bitmap,
                captured_height: viewport.min(content + self.config.canvas_safety_margin - actual),
            });

            if let Some(progress) = self.progress.as_mut() {
                progress(progress_percent(actual, content));
            }

            let bottom = actual + viewport;
            let pinned = actual < requested && requested - actual > self.config.pinned_tolerance;
            if is_final || bottom.ceil() >= content || pinned {
                log::debug!(
                    "Reached bottom (final: {is_final}, covered: {}, pinned: {pinned})",
                    bottom.ceil() >= content
                );
                break;
            }
            current = bottom;
        }

        Ok(steps)
    }

    /// Hide the tool overlay, capture, and show the overlay again
    async fn capture_frame(&mut self) -> Result<Bitmap, CaptureError> {
        self.page.set_tool_overlay_hidden(true);
        self.settle
            .wait_for_stable_frame(SettlePhase::OverlayHidden)
            .await;
        self.throttle.ready().await;
        let frame = self.camera.capture_visible_viewport().await;
        self.page.set_tool_overlay_hidden(false);
        frame
    }
}

/// Estimated step count plus the configured allowance
fn step_limit(content: f64, viewport: f64, extra_steps: usize) -> usize {
    let estimated = if viewport > 0.0 {
        (content / viewport).ceil().max(1.0) as usize
    } else {
        1
    };
    estimated.saturating_add(extra_steps)
}

fn progress_percent(actual: f64, content: f64) -> u8 {
    if content <= 0.0 {
        return 99;
    }
    ((actual / content) * 100.0).round().clamp(0.0, 99.0) as u8
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::capture::{FixedDelay, Immediate};
    use crate::config::ResolverConfig;
    use crate::page::synthetic::{CHROME_COLOR, OVERLAY_COLOR, SyntheticPage};
    use crate::page::{Position, ScrollTargetResolver};

    fn fast_config() -> CaptureConfig {
        CaptureConfig {
            min_capture_interval_ms: 0,
            ..Default::default()
        }
    }

    fn resolve(page: &SyntheticPage) -> ScrollTarget {
        ScrollTargetResolver::new(ResolverConfig::default())
            .resolve(page)
            .0
    }

    async fn run(page: &SyntheticPage, target: &ScrollTarget) -> Result<Vec<CaptureStep>, CaptureError> {
        let mut handle = page.clone();
        let mut camera = page.clone();
        let config = fast_config();
        let mut driver = CaptureDriver::new(&mut handle, &mut camera, Immediate, &config);
        driver.run(target).await
    }

    fn offsets(steps: &[CaptureStep]) -> Vec<f64> {
        steps.iter().map(|s| s.actual_offset).collect()
    }

    #[tokio::test]
    async fn short_page_is_a_single_step() {
        for content in [400.0, 999.0, 1000.0] {
            let page = SyntheticPage::document(800.0, 1000.0, content);
            let target = resolve(&page);
            let steps = run(&page, &target).await.unwrap();
            assert_eq!(offsets(&steps), vec![0.0], "content {content}");
        }
    }

    #[tokio::test]
    async fn three_thousand_pixel_page_takes_three_steps() {
        let page = SyntheticPage::document(800.0, 1000.0, 3000.0);
        let target = resolve(&page);
        let steps = run(&page, &target).await.unwrap();
        assert_eq!(offsets(&steps), vec![0.0, 1000.0, 2000.0]);
        assert_eq!(steps[2].requested_offset, 3000.0);
    }

    #[tokio::test]
    async fn step_count_is_ceil_of_content_over_viewport() {
        for (content, viewport) in [(2500.0, 1000.0), (4000.0, 1000.0), (1700.0, 600.0), (6001.0, 1000.0)] {
            let page = SyntheticPage::document(800.0, viewport, content);
            let target = resolve(&page);
            let steps = run(&page, &target).await.unwrap();
            let expected = (content / viewport).ceil() as usize;
            assert_eq!(steps.len(), expected, "content {content} viewport {viewport}");
        }
    }

    #[tokio::test]
    async fn very_tall_page_is_captured_in_full() {
        let page = SyntheticPage::document(4.0, 1000.0, 250_000.0);
        let target = resolve(&page);
        let steps = run(&page, &target).await.unwrap();
        assert_eq!(steps.len(), 250);
        assert_eq!(steps.last().unwrap().actual_offset, 249_000.0);
    }

    #[tokio::test]
    async fn runaway_run_fails_and_restores_the_page() {
        // Every scroll lands 5px short, so one more step than estimated is needed
        let page = SyntheticPage::document(100.0, 1000.0, 3000.0);
        page.set_scroll_shortfall(5.0);
        let mut handle = page.clone();
        let target = resolve(&page);
        let mut camera = page.clone();
        let config = CaptureConfig {
            min_capture_interval_ms: 0,
            extra_steps: 0,
            ..Default::default()
        };

        let err = CaptureDriver::new(&mut handle, &mut camera, Immediate, &config)
            .run(&target)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::CompositionIncomplete(_)));
        assert_eq!(page.capture_count(), 3);
        assert_eq!(page.scroll_log().last(), Some(&(0.0, 0.0)));

        let steps = run(&page, &target).await.unwrap();
        assert_eq!(offsets(&steps), vec![0.0, 995.0, 1990.0, 2000.0]);
    }

    #[tokio::test]
    async fn pinned_at_bottom_terminates() {
        // The estimate says 5000px but the page really ends at 2700px
        let page = SyntheticPage::document(800.0, 500.0, 5000.0);
        let target = resolve(&page);
        page.set_content_height(2700.0);

        let steps = run(&page, &target).await.unwrap();
        let last = steps.last().unwrap();
        assert_eq!(last.requested_offset, 2500.0);
        assert_eq!(last.actual_offset, 2200.0);
        assert_eq!(offsets(&steps), vec![0.0, 500.0, 1000.0, 1500.0, 2000.0, 2200.0]);
    }

    #[tokio::test]
    async fn shrinking_page_still_terminates() {
        let page = SyntheticPage::document(800.0, 1000.0, 6000.0);
        let target = resolve(&page);
        page.grow_after(2, -4000.0);
        let steps = run(&page, &target).await.unwrap();
        assert!(steps.len() <= 3);
        assert!(steps.iter().all(|s| s.actual_offset <= 1000.0));
    }

    #[tokio::test]
    async fn inner_scroller_is_walked() {
        let page = SyntheticPage::inner_scroller(1280.0, 1000.0, 1200.0, 1000.0, 5000.0);
        let target = resolve(&page);
        let steps = run(&page, &target).await.unwrap();
        assert_eq!(offsets(&steps), vec![0.0, 1000.0, 2000.0, 3000.0, 4000.0]);
        assert_eq!(page.scroll_offset(None), 0.0);
    }

    #[tokio::test]
    async fn chrome_is_only_visible_on_the_first_step() {
        let page = SyntheticPage::document(100.0, 1000.0, 3000.0);
        let header = page.add_fixed(0.0, 50.0, Position::Fixed, Some("visible"));
        let target = resolve(&page);
        let steps = run(&page, &target).await.unwrap();

        let first = steps[0].bitmap.decode().unwrap();
        assert_eq!(*first.get_pixel(0, 10), CHROME_COLOR);
        for step in &steps[1..] {
            let frame = step.bitmap.decode().unwrap();
            assert_ne!(*frame.get_pixel(0, 10), CHROME_COLOR);
        }
        assert_eq!(page.inline_visibility(header).as_deref(), Some("visible"));
    }

    #[tokio::test]
    async fn overlay_never_appears_in_frames() {
        let page = SyntheticPage::document(100.0, 1000.0, 2000.0);
        let target = resolve(&page);
        let steps = run(&page, &target).await.unwrap();
        for step in &steps {
            let frame = step.bitmap.decode().unwrap();
            assert!(frame.pixels().all(|px| *px != OVERLAY_COLOR));
        }
        assert!(!page.is_overlay_hidden());
    }

    #[tokio::test]
    async fn failure_restores_page_state() {
        let page = SyntheticPage::document(100.0, 1000.0, 5000.0);
        let header = page.add_fixed(0.0, 50.0, Position::Sticky, None);
        let mut handle = page.clone();
        handle.scroll_to(None, 700.0);
        page.fail_capture_at(2);
        let target = resolve(&page);

        let err = run(&page, &target).await.unwrap_err();
        assert!(matches!(err, CaptureError::CaptureUnavailable(_)));
        assert_eq!(page.scroll_offset(None), 700.0);
        assert_eq!(page.inline_visibility(header), None);
        assert!(!page.is_overlay_hidden());
    }

    #[tokio::test]
    async fn cancel_between_steps() {
        let page = SyntheticPage::document(100.0, 1000.0, 5000.0);
        let target = resolve(&page);
        let cancel = CancelFlag::new();
        let mut handle = page.clone();
        let mut camera = page.clone();
        let config = fast_config();
        let trigger = cancel.clone();
        let mut driver = CaptureDriver::new(&mut handle, &mut camera, Immediate, &config)
            .with_cancel(cancel)
            .on_progress(move |_| trigger.cancel());

        let err = driver.run(&target).await.unwrap_err();
        assert!(matches!(err, CaptureError::Cancelled));
        assert_eq!(page.capture_count(), 1);
        assert_eq!(page.scroll_offset(None), 0.0);
    }

    #[tokio::test]
    async fn progress_is_capped_below_one_hundred() {
        let page = SyntheticPage::document(100.0, 1000.0, 3000.0);
        let target = resolve(&page);
        let mut handle = page.clone();
        let mut camera = page.clone();
        let config = fast_config();
        let mut seen = Vec::new();
        {
            let mut driver = CaptureDriver::new(&mut handle, &mut camera, Immediate, &config)
                .on_progress(|p| seen.push(p));
            driver.run(&target).await.unwrap();
        }
        assert_eq!(seen, vec![0, 33, 67]);
    }

    #[tokio::test(start_paused = true)]
    async fn captures_respect_minimum_spacing() {
        let page = SyntheticPage::document(100.0, 1000.0, 4000.0);
        let target = resolve(&page);
        let mut handle = page.clone();
        let mut camera = page.clone();
        let config = CaptureConfig {
            settle_delay_ms: 0,
            overlay_hide_delay_ms: 0,
            chrome_toggle_delay_ms: 0,
            min_capture_interval_ms: 500,
            ..Default::default()
        };
        let settle = FixedDelay::from_config(&config);
        let mut driver = CaptureDriver::new(&mut handle, &mut camera, settle, &config);
        driver.run(&target).await.unwrap();

        let times = page.capture_times();
        assert_eq!(times.len(), 4);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn default_settle_delay_is_applied_per_step() {
        let page = SyntheticPage::document(100.0, 1000.0, 2000.0);
        let target = resolve(&page);
        let mut handle = page.clone();
        let mut camera = page.clone();
        let config = CaptureConfig::default();
        let settle = FixedDelay::from_config(&config);
        let start = tokio::time::Instant::now();
        let mut driver = CaptureDriver::new(&mut handle, &mut camera, settle, &config);
        driver.run(&target).await.unwrap();
        // two scrolls, two overlay waits, one chrome toggle
        assert_eq!(start.elapsed(), Duration::from_millis(2 * 800 + 2 * 50 + 50));
    }

    #[tokio::test]
    async fn viewport_capture_does_not_scroll() {
        let page = SyntheticPage::document(100.0, 1000.0, 3000.0);
        let mut handle = page.clone();
        let mut camera = page.clone();
        let config = fast_config();
        let mut driver = CaptureDriver::new(&mut handle, &mut camera, Immediate, &config);
        let frame = driver.capture_viewport().await.unwrap().decode().unwrap();
        assert_eq!(frame.dimensions(), (100, 1000));
        assert!(page.scroll_log().is_empty());
    }
}
