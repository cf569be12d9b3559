use crate::document::{Anchor, Document};

/// Immutable snapshot of a selection, taken once at action start.
///
/// The snapshot records the document epoch it was captured under. Restoring
/// after a wholesale content replacement (which bumps the epoch) is skipped;
/// the caller falls back to its own default-position policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSnapshot {
    pub start: Anchor,
    pub end: Anchor,
    pub epoch: u64,
}

impl RangeSnapshot {
    pub fn new(start: Anchor, end: Anchor, epoch: u64) -> Self {
        RangeSnapshot { start, end, epoch }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Zero-width range at this range's end, for continue-from-cursor
    /// semantics (autocomplete inserts after a selection, never over it).
    pub fn collapse_to_end(&self) -> RangeSnapshot {
        RangeSnapshot {
            start: self.end,
            end: self.end,
            epoch: self.epoch,
        }
    }

    /// Whether the snapshot still restores against the document: same epoch
    /// and both anchor spans still present.
    pub fn resolves_in(&self, doc: &Document) -> bool {
        self.epoch == doc.epoch() && doc.contains(self.start) && doc.contains(self.end)
    }

    /// All document text preceding the collapsed point of this range, used as
    /// prompt context. Walks the document structure; `None` when the anchors
    /// no longer resolve.
    pub fn preceding_context(&self, doc: &Document) -> Option<String> {
        if self.epoch != doc.epoch() {
            return None;
        }
        doc.text_before(self.end)
    }
}
