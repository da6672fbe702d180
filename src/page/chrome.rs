//! Fixed and sticky chrome suppression
//!
//! Headers and toolbars that stay anchored while scrolling would be stamped
//! into every step of the stitched image. They stay visible for the step at
//! offset zero and are hidden for every later step.

use crate::domain::ElementId;

use super::{PageStateHandle, Position};

/// Fixed/sticky elements found by one scan, with their original inline visibility
#[derive(Debug, Default)]
pub struct FixedChromeSet {
    entries: Vec<(ElementId, Option<String>)>,
    hidden: bool,
}

impl FixedChromeSet {
    /// Collect every visible fixed/sticky element except the scroller itself
    pub fn capture<P: PageStateHandle + ?Sized>(page: &P, scroller: Option<ElementId>) -> Self {
        let entries: Vec<_> = page
            .elements()
            .into_iter()
            .filter(|el| matches!(el.position, Position::Fixed | Position::Sticky))
            .filter(|el| el.is_rendered())
            .filter(|el| Some(el.id) != scroller)
            .map(|el| (el.id, page.inline_visibility(el.id)))
            .collect();
        log::debug!("Found {} fixed/sticky elements", entries.len());
        Self {
            entries,
            hidden: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Hide every element, or put back the inline visibility seen at scan time
    pub fn set_hidden<P: PageStateHandle + ?Sized>(&mut self, page: &mut P, hidden: bool) {
        for (id, original) in &self.entries {
            if hidden {
                page.set_inline_visibility(*id, Some("hidden"));
            } else {
                page.set_inline_visibility(*id, original.as_deref());
            }
        }
        self.hidden = hidden;
    }
}
