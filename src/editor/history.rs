//! Linear undo history of the annotation overlay

use tiny_skia::Pixmap;

/// What the overlay should show after an undo
#[derive(Debug)]
pub enum Undo<'a> {
    /// Repaint the overlay from this snapshot
    Restore(&'a Pixmap),
    /// Clear the overlay; nothing is drawn any more
    Clear,
    /// Already at the "nothing drawn" position
    Nothing,
}

/// Full-overlay snapshots plus the current position
///
/// `index == None` is the "nothing drawn" position, one step before the
/// stored blank snapshot at index 0.
#[derive(Debug, Default)]
pub struct AnnotationHistory {
    snapshots: Vec<Pixmap>,
    index: Option<usize>,
}

impl AnnotationHistory {
    /// History containing only the blank state
    pub fn seeded(blank: Pixmap) -> Self {
        Self {
            snapshots: vec![blank],
            index: Some(0),
        }
    }

    /// Record a snapshot after a completed stroke, dropping any redo tail
    pub fn push(&mut self, snapshot: Pixmap) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.snapshots.truncate(keep);
        self.snapshots.push(snapshot);
        self.index = Some(self.snapshots.len() - 1);
    }

    pub fn undo(&mut self) -> Undo<'_> {
        match self.index {
            Some(0) => {
                self.index = None;
                Undo::Clear
            }
            Some(i) => {
                self.index = Some(i - 1);
                Undo::Restore(&self.snapshots[i - 1])
            }
            None => Undo::Nothing,
        }
    }

    /// Jump to the "nothing drawn" position without dropping snapshots
    pub fn rewind(&mut self) {
        self.index = None;
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(marker: u8) -> Pixmap {
        let mut pixmap = Pixmap::new(2, 2).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(marker, 0, 0, 255));
        pixmap
    }

    fn marker(pixmap: &Pixmap) -> u8 {
        pixmap.pixels()[0].red()
    }

    #[test]
    fn undo_walks_back_to_blank_then_clears() {
        let mut history = AnnotationHistory::seeded(layer(0));
        history.push(layer(1));
        history.push(layer(2));
        assert_eq!(history.index(), Some(2));

        assert!(matches!(history.undo(), Undo::Restore(p) if marker(p) == 1));
        assert!(matches!(history.undo(), Undo::Restore(p) if marker(p) == 0));
        assert!(matches!(history.undo(), Undo::Clear));
        assert!(matches!(history.undo(), Undo::Nothing));
        assert!(!history.can_undo());
    }

    #[test]
    fn push_after_undo_drops_redo_tail() {
        let mut history = AnnotationHistory::seeded(layer(0));
        history.push(layer(1));
        history.push(layer(2));
        let _ = history.undo();
        history.push(layer(3));
        assert_eq!(history.len(), 3);
        assert!(matches!(history.undo(), Undo::Restore(p) if marker(p) == 1));
    }

    #[test]
    fn push_from_nothing_drawn_starts_over() {
        let mut history = AnnotationHistory::seeded(layer(0));
        history.push(layer(1));
        history.rewind();
        history.push(layer(5));
        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), Some(0));
    }
}
