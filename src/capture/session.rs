//! One capture session, from resolving the scroller to handing off the result

use image::RgbaImage;

use crate::config::Config;
use crate::domain::{CaptureError, Composite};
use crate::output::{self, ClipboardSink, ResultSink};
use crate::page::{DocumentKind, PageStateHandle, ResolvedBy, ScrollTargetResolver};
use crate::render::{self, Compositor};

use super::{CancelFlag, CaptureDriver, CapturePrimitive, DocumentBitmapProvider, StableFrame};

/// Where a finished capture goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureMode {
    /// Store it for the analysis step and announce it
    #[default]
    Analyze,
    /// Put it on the clipboard
    Clipboard,
}

pub struct CaptureSession {
    config: Config,
    cancel: CancelFlag,
}

impl CaptureSession {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Flag that cancels a running capture between steps
    ///
    /// A cancel raised while idle stops the next run. The flag is re-armed
    /// whenever a run ends.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scroll through the page and stitch every step
    ///
    /// Non-HTML documents are refused with [`CaptureError::BinaryDocument`]
    /// before anything is scrolled; use [`CaptureSession::capture_document`].
    pub async fn capture_full_page<P, C, S>(
        &self,
        page: &mut P,
        camera: &mut C,
        settle: S,
        progress: impl FnMut(u8),
    ) -> Result<Composite, CaptureError>
    where
        P: PageStateHandle + ?Sized,
        C: CapturePrimitive + ?Sized,
        S: StableFrame,
    {
        let (target, resolved_by) = ScrollTargetResolver::new(self.config.resolver.clone()).resolve(&*page);
        log::info!("Scroll target resolved by {resolved_by:?}");
        if resolved_by == ResolvedBy::BinaryDocument {
            self.cancel.reset();
            let content_type = match page.document_kind() {
                DocumentKind::Binary { content_type } => content_type,
                DocumentKind::Html => "non-HTML".to_string(),
            };
            return Err(CaptureError::BinaryDocument { content_type });
        }
        let device_pixel_ratio = page.document_metrics().device_pixel_ratio;

        let steps = CaptureDriver::new(page, camera, settle, &self.config.capture)
            .with_cancel(self.cancel.clone())
            .on_progress(progress)
            .run(&target)
            .await;
        self.cancel.reset();

        Compositor::new(&self.config.capture).composite(&target, &steps?, device_pixel_ratio)
    }

    /// Capture only what is visible right now
    pub async fn capture_viewport<P, C, S>(
        &self,
        page: &mut P,
        camera: &mut C,
        settle: S,
    ) -> Result<Composite, CaptureError>
    where
        P: PageStateHandle + ?Sized,
        C: CapturePrimitive + ?Sized,
        S: StableFrame,
    {
        let device_pixel_ratio = page.document_metrics().device_pixel_ratio;
        let bitmap = CaptureDriver::new(page, camera, settle, &self.config.capture)
            .with_cancel(self.cancel.clone())
            .capture_viewport()
            .await;
        self.cancel.reset();
        Ok(Composite::new(bitmap?.decode()?, device_pixel_ratio))
    }

    /// Whether the page is a non-HTML document that should go through
    /// [`CaptureSession::capture_document`]
    pub fn is_binary_document<P: PageStateHandle + ?Sized>(&self, page: &P) -> bool {
        let (_, resolved_by) = ScrollTargetResolver::new(self.config.resolver.clone()).resolve(page);
        resolved_by == ResolvedBy::BinaryDocument
    }

    /// Render a non-HTML document through `provider` and stack its pages
    pub async fn capture_document<P, D>(&self, page: &P, provider: &mut D) -> Result<Composite, CaptureError>
    where
        P: PageStateHandle + ?Sized,
        D: DocumentBitmapProvider + ?Sized,
    {
        let result = self.render_document(page, provider).await;
        self.cancel.reset();
        result
    }

    async fn render_document<P, D>(&self, page: &P, provider: &mut D) -> Result<Composite, CaptureError>
    where
        P: PageStateHandle + ?Sized,
        D: DocumentBitmapProvider + ?Sized,
    {
        let bytes = page.document_bytes().ok_or_else(|| {
            CaptureError::DocumentRender("document source is not available".to_string())
        })?;
        let limit = self.config.output.max_document_bytes;
        if bytes.len() > limit {
            return Err(CaptureError::DocumentTooLarge {
                size: bytes.len(),
                limit,
            });
        }
        if self.cancel.is_cancelled() {
            return Err(CaptureError::Cancelled);
        }

        let pages: Vec<RgbaImage> = provider.render_pages(&bytes).await?;
        log::info!("Document rendered into {} pages", pages.len());
        Ok(Composite::new(render::stack_pages(&pages)?, 1.0))
    }

    /// Hand a finished composite to the sink picked by `mode`
    ///
    /// The composite is only borrowed so a failed clipboard write can be retried.
    pub fn deliver<R, K>(
        &self,
        composite: &Composite,
        mode: CaptureMode,
        results: &mut R,
        clipboard: &mut K,
    ) -> anyhow::Result<()>
    where
        R: ResultSink + ?Sized,
        K: ClipboardSink + ?Sized,
    {
        match mode {
            CaptureMode::Analyze => {
                results.store_capture(composite)?;
                results.announce_result_ready();
            }
            CaptureMode::Clipboard => output::copy_to_clipboard(clipboard, &composite.image)?,
        }
        Ok(())
    }
}
