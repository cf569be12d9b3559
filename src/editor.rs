use anyhow::{anyhow, Context, Result};

use crate::document::{Anchor, Document, FormatCommand};
use crate::selection::RangeSnapshot;

/// The editing surface: the document plus the live selection and the word
/// count derived from it.
///
/// The live selection plays the role a native selection does in a windowed
/// editor: user-driven, mutated by every edit, and the thing formatting
/// commands operate on directly. Asynchronous actions never touch it without
/// going through a captured `RangeSnapshot` first.
#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    selection: Option<(Anchor, Anchor)>,
    word_count: usize,
}

impl Editor {
    pub fn new() -> Self {
        Editor::with_text("")
    }

    pub fn with_text(text: &str) -> Self {
        let document = Document::from_text(text);
        let word_count = document.word_count();
        Editor {
            document,
            selection: None,
            word_count,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Snapshot the live selection. `None` when nothing is selected.
    pub fn capture(&self) -> Option<RangeSnapshot> {
        let (start, end) = self.selection?;
        Some(RangeSnapshot::new(start, end, self.document.epoch()))
    }

    /// Re-select a captured range. Returns `false` (leaving the live
    /// selection untouched) when the snapshot no longer resolves, e.g. after
    /// a wholesale content replacement or when an anchor span was deleted.
    pub fn restore(&mut self, range: &RangeSnapshot) -> bool {
        if !range.resolves_in(&self.document) {
            return false;
        }
        self.selection = Some((range.start, range.end));
        true
    }

    /// Select the first occurrence of `needle` in the plain text.
    pub fn select_str(&mut self, needle: &str) -> Result<()> {
        let text = self.document.text();
        let at = text
            .find(needle)
            .ok_or_else(|| anyhow!("selection text not found in document"))?;
        let start = self
            .document
            .anchor_at(at)
            .context("selection start does not resolve")?;
        let end = self
            .document
            .anchor_at(at + needle.len())
            .context("selection end does not resolve")?;
        self.selection = Some((start, end));
        Ok(())
    }

    pub fn select_range(&mut self, start: Anchor, end: Anchor) {
        self.selection = Some((start, end));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Collapse the caret to the end of the document.
    pub fn caret_to_end(&mut self) {
        let end = self.document.end_anchor();
        self.selection = Some((end, end));
    }

    /// Text under the live selection, empty when collapsed or unset.
    pub fn selected_text(&self) -> String {
        match self.selection {
            Some((start, end)) => self
                .document
                .text_between(start, end)
                .unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Replace a captured range with `text`: restore the selection, replace
    /// it atomically, recount words. Errors when the range no longer
    /// restores; callers decide the fallback (usually a whole-document
    /// replace).
    pub fn replace_range(&mut self, range: &RangeSnapshot, text: &str) -> Result<()> {
        if !self.restore(range) {
            return Err(anyhow!("captured range no longer restores"));
        }
        let caret = self.document.replace(range.start, range.end, text)?;
        self.selection = Some((caret, caret));
        self.on_content_change();
        Ok(())
    }

    /// Insert text at the live caret (collapsing a non-collapsed selection to
    /// its end first). Insert-only: never deletes existing content.
    pub fn insert_at_cursor(&mut self, text: &str) -> Result<()> {
        let at = match self.selection {
            Some((_, end)) if self.document.contains(end) => end,
            _ => self.document.end_anchor(),
        };
        let caret = self.document.insert(at, text)?;
        self.selection = Some((caret, caret));
        self.on_content_change();
        Ok(())
    }

    /// Wholesale content replacement; invalidates every captured range and
    /// leaves the caret at the end.
    pub fn set_content(&mut self, text: &str) {
        self.document.set_content(text);
        self.caret_to_end();
        self.on_content_change();
    }

    /// Apply a formatting command to the live selection, synchronously with
    /// the triggering gesture. No capture/restore cycle: formatting operates
    /// on whatever is selected right now.
    pub fn format(&mut self, cmd: &FormatCommand) -> Result<()> {
        let (start, end) = self
            .selection
            .ok_or_else(|| anyhow!("no selection to format"))?;
        self.document.apply_format(start, end, cmd)?;
        self.on_content_change();
        Ok(())
    }

    fn on_content_change(&mut self) {
        self.word_count = self.document.word_count();
    }
}

impl Default for Editor {
    fn default() -> Self {
        Editor::new()
    }
}
