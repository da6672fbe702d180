//! Decide which scroller a capture run should walk

use crate::config::ResolverConfig;
use crate::domain::ScrollTarget;

use super::{DocumentKind, ElementInfo, Overflow, PageStateHandle};

/// Why a particular scroller was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    /// Non-HTML document, forced whole-document scroll
    BinaryDocument,
    /// The document is clearly taller than the viewport
    Document,
    /// The largest scrollable inner element
    InnerScroller,
    /// Nothing qualified; whole-document scroll as a fallback
    Fallback,
}

pub struct ScrollTargetResolver {
    config: ResolverConfig,
}

impl ScrollTargetResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Resolve the scroll target of `page`
    pub fn resolve<P: PageStateHandle + ?Sized>(&self, page: &P) -> (ScrollTarget, ResolvedBy) {
        let metrics = page.document_metrics();
        let document_target = ScrollTarget {
            container: None,
            content_height: metrics.scroll_height,
            viewport_height: metrics.viewport_height,
            viewport_width: metrics.viewport_width,
        };

        if let DocumentKind::Binary { content_type } = page.document_kind() {
            log::info!("Binary document ({content_type}), forcing document scroll");
            return (document_target, ResolvedBy::BinaryDocument);
        }

        let document_scrolls = metrics.scroll_height
            > metrics.viewport_height + self.config.height_margin
            && metrics.body_overflow_y != Overflow::Hidden
            && metrics.root_overflow_y != Overflow::Hidden;
        if document_scrolls {
            log::debug!(
                "Document scrolls: {} > {} + {}",
                metrics.scroll_height,
                metrics.viewport_height,
                self.config.height_margin
            );
            return (document_target, ResolvedBy::Document);
        }

        match self.largest_scroller(&page.elements()) {
            Some(el) => {
                log::info!(
                    "Found inner scroller {:?}: height {} in {} ({}x{})",
                    el.id,
                    el.scroll_height,
                    el.client_height,
                    el.rect_width,
                    el.rect_height
                );
                let target = ScrollTarget {
                    container: Some(el.id),
                    content_height: el.scroll_height,
                    viewport_height: el.client_height,
                    viewport_width: metrics.viewport_width,
                };
                (target, ResolvedBy::InnerScroller)
            }
            None => {
                log::debug!("No scroller qualified, falling back to document scroll");
                (document_target, ResolvedBy::Fallback)
            }
        }
    }

    fn largest_scroller<'a>(&self, elements: &'a [ElementInfo]) -> Option<&'a ElementInfo> {
        let mut best: Option<&ElementInfo> = None;
        let mut max_area = 0.0;
        for el in elements {
            if el.scroll_height <= el.client_height {
                continue;
            }
            if el.rect_width <= 0.0 || el.rect_height <= 0.0 {
                continue;
            }
            // Hidden overflow still counts: custom scrollbar libraries
            // scroll such elements programmatically
            let scrollable = matches!(
                el.overflow_y,
                Overflow::Auto | Overflow::Scroll | Overflow::Hidden
            );
            if !scrollable {
                continue;
            }
            let area = el.area();
            if area > max_area && area > self.config.min_scroller_area {
                max_area = area;
                best = Some(el);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ElementId;
    use crate::page::synthetic::SyntheticPage;

    fn resolver() -> ScrollTargetResolver {
        ScrollTargetResolver::new(ResolverConfig::default())
    }

    #[test]
    fn tall_document_scrolls_itself() {
        let page = SyntheticPage::document(1280.0, 1000.0, 3000.0);
        let (target, by) = resolver().resolve(&page);
        assert_eq!(by, ResolvedBy::Document);
        assert!(target.is_document());
        assert_eq!(target.content_height, 3000.0);
        assert_eq!(target.viewport_height, 1000.0);
    }

    #[test]
    fn inner_scroller_wins_over_short_document() {
        // 5000px of content inside a 1000px overflow:auto wrapper
        let page = SyntheticPage::inner_scroller(1280.0, 1000.0, 1200.0, 1000.0, 5000.0);
        let (target, by) = resolver().resolve(&page);
        assert_eq!(by, ResolvedBy::InnerScroller);
        assert_eq!(target.container, Some(SyntheticPage::INNER_SCROLLER));
        assert_eq!(target.content_height, 5000.0);
        assert_eq!(target.viewport_height, 1000.0);
    }

    #[test]
    fn small_scrollers_are_ignored() {
        let page = SyntheticPage::document(1280.0, 1000.0, 1000.0);
        page.add_element(ElementInfo {
            id: ElementId(42),
            position: Default::default(),
            overflow_y: Overflow::Auto,
            display_none: false,
            visibility_hidden: false,
            opacity: 1.0,
            scroll_height: 900.0,
            client_height: 100.0,
            rect_width: 200.0,
            rect_height: 100.0,
        });
        let (target, by) = resolver().resolve(&page);
        assert_eq!(by, ResolvedBy::Fallback);
        assert!(target.is_document());
    }

    #[test]
    fn largest_area_wins() {
        let page = SyntheticPage::inner_scroller(1280.0, 1000.0, 1200.0, 1000.0, 5000.0);
        page.add_element(ElementInfo {
            id: ElementId(7),
            position: Default::default(),
            overflow_y: Overflow::Scroll,
            display_none: false,
            visibility_hidden: false,
            opacity: 1.0,
            scroll_height: 3000.0,
            client_height: 400.0,
            rect_width: 300.0,
            rect_height: 400.0,
        });
        let (target, _) = resolver().resolve(&page);
        assert_eq!(target.container, Some(SyntheticPage::INNER_SCROLLER));
    }

    #[test]
    fn hidden_body_overflow_disables_document_scroll() {
        let page = SyntheticPage::document(1280.0, 1000.0, 3000.0);
        page.set_body_overflow(Overflow::Hidden);
        let (_, by) = resolver().resolve(&page);
        assert_eq!(by, ResolvedBy::Fallback);
    }

    #[test]
    fn binary_documents_force_document_scroll() {
        let page = SyntheticPage::inner_scroller(1280.0, 1000.0, 1200.0, 1000.0, 5000.0);
        page.set_binary("application/pdf", vec![1, 2, 3]);
        let (target, by) = resolver().resolve(&page);
        assert_eq!(by, ResolvedBy::BinaryDocument);
        assert!(target.is_document());
    }

    #[test]
    fn margin_is_configurable() {
        let page = SyntheticPage::document(1280.0, 1000.0, 1040.0);
        let (_, by) = resolver().resolve(&page);
        assert_eq!(by, ResolvedBy::Fallback);

        let strict = ScrollTargetResolver::new(ResolverConfig {
            height_margin: 10.0,
            ..Default::default()
        });
        let (_, by) = strict.resolve(&page);
        assert_eq!(by, ResolvedBy::Document);
    }
}
