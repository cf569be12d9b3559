use anyhow::{anyhow, Result};

/// Stable identity of a text span. Ids are never reused within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(u64);

/// A structural position: a span id plus a byte offset into that span's text.
///
/// Anchors survive edits elsewhere in the document because they name a span,
/// not an absolute character count. An anchor into a span that was deleted no
/// longer resolves; an offset past the span's current end is clamped to it.
/// Anchors into the edited region of a span are clamped, not shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub span: SpanId,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Bulleted,
    Numbered,
}

/// Formatting operations over a range (inline) or the blocks it touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    Block(BlockKind),
    Color(String),
}

#[derive(Debug, Clone)]
struct Span {
    id: SpanId,
    style: InlineStyle,
    text: String,
}

#[derive(Debug, Clone)]
struct Block {
    kind: BlockKind,
    spans: Vec<Span>,
}

/// Structured text buffer: a sequence of blocks, each a sequence of styled
/// spans. Blocks are separated by a single newline in the plain-text view.
///
/// Invariant: there is always at least one block, and every block has at
/// least one span (possibly empty).
#[derive(Debug, Clone)]
pub struct Document {
    blocks: Vec<Block>,
    next_span: u64,
    epoch: u64,
}

/// Resolved anchor position, valid only until the next mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Location {
    block: usize,
    span: usize,
    offset: usize,
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Document {
            blocks: Vec::new(),
            next_span: 0,
            epoch: 0,
        };
        doc.blocks = doc.blocks_from_text("");
        doc
    }

    pub fn from_text(text: &str) -> Self {
        let mut doc = Document {
            blocks: Vec::new(),
            next_span: 0,
            epoch: 0,
        };
        doc.blocks = doc.blocks_from_text(text);
        doc
    }

    /// Wholesale content replacement. Discards all structure and bumps the
    /// epoch so ranges captured before the replacement no longer restore.
    pub fn set_content(&mut self, text: &str) {
        self.blocks = self.blocks_from_text(text);
        self.epoch += 1;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            for span in &block.spans {
                out.push_str(&span.text);
            }
        }
        out
    }

    pub fn word_count(&self) -> usize {
        self.text().split_whitespace().count()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.spans.iter().all(|s| s.text.is_empty()))
    }

    /// Whether the anchor's span is still part of the document.
    pub fn contains(&self, anchor: Anchor) -> bool {
        self.locate(anchor).is_some()
    }

    /// Anchor at the very end of the document.
    pub fn end_anchor(&self) -> Anchor {
        let block = self.blocks.last().expect("document has at least one block");
        let span = block.spans.last().expect("block has at least one span");
        Anchor {
            span: span.id,
            offset: span.text.len(),
        }
    }

    /// Anchor for a byte offset into the plain-text view, or `None` if the
    /// offset is past the end or not a char boundary.
    pub fn anchor_at(&self, offset: usize) -> Option<Anchor> {
        let mut remaining = offset;
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                // Consume the block separator; an offset landing on it snaps
                // to the start of this block.
                remaining = remaining.checked_sub(1)?;
            }
            let block_len: usize = block.spans.iter().map(|s| s.text.len()).sum();
            if remaining <= block_len {
                for (sidx, span) in block.spans.iter().enumerate() {
                    let last = sidx == block.spans.len() - 1;
                    if remaining < span.text.len() || (last && remaining == span.text.len()) {
                        if !span.text.is_char_boundary(remaining) {
                            return None;
                        }
                        return Some(Anchor {
                            span: span.id,
                            offset: remaining,
                        });
                    }
                    remaining -= span.text.len();
                }
                // Empty block.
                let span = block.spans.last()?;
                return Some(Anchor {
                    span: span.id,
                    offset: 0,
                });
            }
            remaining -= block_len;
        }
        None
    }

    /// All plain text strictly before the anchor, or `None` if the anchor no
    /// longer resolves. Walks the block/span structure rather than slicing a
    /// flat string.
    pub fn text_before(&self, anchor: Anchor) -> Option<String> {
        let loc = self.locate(anchor)?;
        let mut out = String::new();
        for (idx, block) in self.blocks.iter().enumerate().take(loc.block + 1) {
            if idx > 0 {
                out.push('\n');
            }
            if idx < loc.block {
                for span in &block.spans {
                    out.push_str(&span.text);
                }
                continue;
            }
            for (sidx, span) in block.spans.iter().enumerate() {
                if sidx < loc.span {
                    out.push_str(&span.text);
                } else if sidx == loc.span {
                    out.push_str(&span.text[..loc.offset]);
                }
            }
        }
        Some(out)
    }

    /// Plain text between two anchors (order-insensitive).
    pub fn text_between(&self, a: Anchor, b: Anchor) -> Option<String> {
        let a = self.abs_offset(a)?;
        let b = self.abs_offset(b)?;
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let text = self.text();
        Some(text[start..end].to_string())
    }

    /// Insert text at the anchor. Returns the caret anchor just after the
    /// inserted text.
    pub fn insert(&mut self, at: Anchor, text: &str) -> Result<Anchor> {
        self.replace(at, at, text)
    }

    /// Replace everything between the two anchors (order-insensitive) with
    /// `text`. Returns the caret anchor at the end of the inserted text.
    ///
    /// Behavior:
    /// - Spans and blocks wholly inside the range are removed; anchors into
    ///   them stop resolving.
    /// - A range crossing block boundaries merges the tail of the last block
    ///   into the first.
    /// - Newlines in `text` start new blocks of the same kind as the
    ///   insertion block.
    pub fn replace(&mut self, start: Anchor, end: Anchor, text: &str) -> Result<Anchor> {
        let sloc = self
            .locate(start)
            .ok_or_else(|| anyhow!("start anchor is no longer part of the document"))?;
        let eloc = self
            .locate(end)
            .ok_or_else(|| anyhow!("end anchor is no longer part of the document"))?;
        let (sloc, eloc) = if sloc <= eloc { (sloc, eloc) } else { (eloc, sloc) };

        self.delete_between(sloc, eloc);
        Ok(self.insert_at(sloc, text))
    }

    /// Apply a formatting command to the range (order-insensitive).
    ///
    /// Inline commands split spans at the range boundaries and toggle the
    /// style bit (set if any covered span lacks it, clear otherwise), the way
    /// a native toggle command behaves. Block commands retag every block the
    /// range touches. A collapsed range is a no-op for inline commands.
    pub fn apply_format(&mut self, start: Anchor, end: Anchor, cmd: &FormatCommand) -> Result<()> {
        let sloc = self
            .locate(start)
            .ok_or_else(|| anyhow!("start anchor is no longer part of the document"))?;
        let eloc = self
            .locate(end)
            .ok_or_else(|| anyhow!("end anchor is no longer part of the document"))?;
        let (sloc, eloc) = if sloc <= eloc { (sloc, eloc) } else { (eloc, sloc) };

        if let FormatCommand::Block(kind) = cmd {
            for block in &mut self.blocks[sloc.block..=eloc.block] {
                block.kind = *kind;
            }
            return Ok(());
        }

        if sloc == eloc {
            return Ok(());
        }

        // Split at the end boundary first so the start indices stay valid.
        let end_len = self.blocks[eloc.block].spans[eloc.span].text.len();
        let mut end_exclusive = if eloc.offset == 0 { eloc.span } else { eloc.span + 1 };
        if eloc.offset > 0 && eloc.offset < end_len {
            self.split_span(eloc.block, eloc.span, eloc.offset);
        }

        let start_len = self.blocks[sloc.block].spans[sloc.span].text.len();
        let start_span = if sloc.offset == 0 {
            sloc.span
        } else {
            if sloc.offset < start_len {
                self.split_span(sloc.block, sloc.span, sloc.offset);
                if sloc.block == eloc.block {
                    end_exclusive += 1;
                }
            }
            sloc.span + 1
        };

        let mut covered: Vec<(usize, usize)> = Vec::new();
        for bidx in sloc.block..=eloc.block {
            let first = if bidx == sloc.block { start_span } else { 0 };
            let last = if bidx == eloc.block {
                if sloc.block == eloc.block {
                    end_exclusive
                } else {
                    if eloc.offset == 0 {
                        eloc.span
                    } else {
                        eloc.span + 1
                    }
                }
            } else {
                self.blocks[bidx].spans.len()
            };
            for sidx in first..last.min(self.blocks[bidx].spans.len()) {
                covered.push((bidx, sidx));
            }
        }

        match cmd {
            FormatCommand::Bold => {
                let set = covered
                    .iter()
                    .any(|&(b, s)| !self.blocks[b].spans[s].style.bold);
                for &(b, s) in &covered {
                    self.blocks[b].spans[s].style.bold = set;
                }
            }
            FormatCommand::Italic => {
                let set = covered
                    .iter()
                    .any(|&(b, s)| !self.blocks[b].spans[s].style.italic);
                for &(b, s) in &covered {
                    self.blocks[b].spans[s].style.italic = set;
                }
            }
            FormatCommand::Underline => {
                let set = covered
                    .iter()
                    .any(|&(b, s)| !self.blocks[b].spans[s].style.underline);
                for &(b, s) in &covered {
                    self.blocks[b].spans[s].style.underline = set;
                }
            }
            FormatCommand::Color(color) => {
                for &(b, s) in &covered {
                    self.blocks[b].spans[s].style.color = Some(color.clone());
                }
            }
            FormatCommand::Block(_) => unreachable!("handled above"),
        }

        Ok(())
    }

    /// Style of the span the anchor points into, for inspection.
    pub fn style_at(&self, anchor: Anchor) -> Option<InlineStyle> {
        let loc = self.locate(anchor)?;
        Some(self.blocks[loc.block].spans[loc.span].style.clone())
    }

    /// Block kind at the anchor, for inspection.
    pub fn block_kind_at(&self, anchor: Anchor) -> Option<BlockKind> {
        let loc = self.locate(anchor)?;
        Some(self.blocks[loc.block].kind)
    }

    fn alloc_span(&mut self, style: InlineStyle, text: String) -> Span {
        let id = SpanId(self.next_span);
        self.next_span += 1;
        Span { id, style, text }
    }

    fn blocks_from_text(&mut self, text: &str) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        for line in text.split('\n') {
            let span = self.alloc_span(InlineStyle::default(), line.to_string());
            blocks.push(Block {
                kind: BlockKind::Paragraph,
                spans: vec![span],
            });
        }
        if blocks.is_empty() {
            let span = self.alloc_span(InlineStyle::default(), String::new());
            blocks.push(Block {
                kind: BlockKind::Paragraph,
                spans: vec![span],
            });
        }
        blocks
    }

    fn locate(&self, anchor: Anchor) -> Option<Location> {
        for (bidx, block) in self.blocks.iter().enumerate() {
            for (sidx, span) in block.spans.iter().enumerate() {
                if span.id == anchor.span {
                    let mut offset = anchor.offset.min(span.text.len());
                    while !span.text.is_char_boundary(offset) {
                        offset -= 1;
                    }
                    return Some(Location {
                        block: bidx,
                        span: sidx,
                        offset,
                    });
                }
            }
        }
        None
    }

    fn abs_offset(&self, anchor: Anchor) -> Option<usize> {
        let loc = self.locate(anchor)?;
        let mut total = 0usize;
        for (bidx, block) in self.blocks.iter().enumerate().take(loc.block + 1) {
            if bidx > 0 {
                total += 1;
            }
            if bidx < loc.block {
                total += block.spans.iter().map(|s| s.text.len()).sum::<usize>();
                continue;
            }
            for span in block.spans.iter().take(loc.span) {
                total += span.text.len();
            }
        }
        Some(total + loc.offset)
    }

    /// Remove everything between the two ordered locations. Afterwards the
    /// caret sits at `sloc` (whose block/span indices remain valid).
    fn delete_between(&mut self, sloc: Location, eloc: Location) {
        if sloc == eloc {
            return;
        }

        if sloc.block == eloc.block && sloc.span == eloc.span {
            let span = &mut self.blocks[sloc.block].spans[sloc.span];
            span.text.replace_range(sloc.offset..eloc.offset, "");
            return;
        }

        if sloc.block == eloc.block {
            let block = &mut self.blocks[sloc.block];
            block.spans[sloc.span].text.truncate(sloc.offset);
            let tail = block.spans[eloc.span].text[eloc.offset..].to_string();
            block.spans[eloc.span].text = tail;
            block.spans.drain(sloc.span + 1..eloc.span);
            return;
        }

        // Range crosses block boundaries: trim both ends, drop everything in
        // between, then merge the end block's tail into the start block.
        let mut end_block = self.blocks.remove(eloc.block);
        end_block.spans.drain(..eloc.span);
        let tail = end_block.spans[0].text[eloc.offset..].to_string();
        end_block.spans[0].text = tail;

        self.blocks.drain(sloc.block + 1..eloc.block);

        let start_block = &mut self.blocks[sloc.block];
        start_block.spans[sloc.span].text.truncate(sloc.offset);
        start_block.spans.truncate(sloc.span + 1);
        start_block.spans.append(&mut end_block.spans);
    }

    /// Insert text at the location; `loc` must be valid. Returns the caret
    /// anchor after the inserted text.
    fn insert_at(&mut self, loc: Location, text: &str) -> Anchor {
        if !text.contains('\n') {
            let span = &mut self.blocks[loc.block].spans[loc.span];
            span.text.insert_str(loc.offset, text);
            return Anchor {
                span: span.id,
                offset: loc.offset + text.len(),
            };
        }

        let kind = self.blocks[loc.block].kind;
        let style = self.blocks[loc.block].spans[loc.span].style.clone();
        let suffix = self.blocks[loc.block].spans[loc.span].text.split_off(loc.offset);
        let trailing: Vec<Span> = self.blocks[loc.block].spans.split_off(loc.span + 1);

        let mut lines = text.split('\n');
        let first = lines.next().unwrap_or_default();
        self.blocks[loc.block].spans[loc.span].text.push_str(first);

        let mut caret = Anchor {
            span: self.blocks[loc.block].spans[loc.span].id,
            offset: self.blocks[loc.block].spans[loc.span].text.len(),
        };

        let mut insert_block = loc.block;
        for line in lines {
            let span = self.alloc_span(style.clone(), line.to_string());
            caret = Anchor {
                span: span.id,
                offset: span.text.len(),
            };
            insert_block += 1;
            self.blocks.insert(
                insert_block,
                Block {
                    kind,
                    spans: vec![span],
                },
            );
        }

        if !suffix.is_empty() {
            let span = self.alloc_span(style, suffix);
            self.blocks[insert_block].spans.push(span);
        }
        for span in trailing {
            self.blocks[insert_block].spans.push(span);
        }

        caret
    }

    /// Split a span in two at `offset`; the prefix keeps the id, the suffix
    /// gets a fresh one with the same style.
    fn split_span(&mut self, block: usize, span: usize, offset: usize) {
        let style = self.blocks[block].spans[span].style.clone();
        let suffix = self.blocks[block].spans[span].text.split_off(offset);
        let new = self.alloc_span(style, suffix);
        self.blocks[block].spans.insert(span + 1, new);
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}
