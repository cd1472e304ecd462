//! Display-line layout.
//!
//! [`layout_dline`] turns the bytes of a logical line starting at a given
//! offset into one display line: a list of positioned chunks plus height,
//! baseline and the number of bytes consumed. Layout walks the segments of
//! the line left to right, measuring runs of characters against the right
//! edge. When a run overflows, the line breaks at the latest opportunity the
//! wrap mode allows: inside the run, or by backtracking to an earlier chunk
//! (a soft hyphen, whitespace, a tab). With no opportunity at all the line
//! breaks between characters, and a line always consumes at least one
//! grapheme so layout makes progress even in a zero-width window.

use crate::config::DisplayConfig;
use crate::layout::breaks::BreakClass;
use crate::layout::chunk::{CharRun, Chunk, ChunkKind};
use crate::layout::dline::{DLine, DLineFlags};
use crate::layout::hyphen::{carry_prefix, hyphen_break, HyphenBreak, HyphenRule};
use crate::layout::justify::justify_line;
use crate::layout::tabs::{adjust_for_tab, default_tab_width, next_tab_stop, TabTarget};
use crate::metrics::cache::search_disp_line_entry;
use crate::metrics::epoch::Epoch;
use crate::model::font::FontMetrics;
use crate::model::index::TextIndex;
use crate::model::segment::{Segment, SegmentKind, INSERT_MARK};
use crate::model::store::{LogicalLine, TextStore, HYPHEN_PLACEHOLDER};
use crate::model::style::{Justify, StyleRef, TabAlign, WrapMode};
use std::cell::Cell;
use std::rc::Rc;
use unicode_segmentation::UnicodeSegmentation;

/// Everything layout reads: the document, the fonts, the view geometry and
/// the metric epoch. Counts the display lines it lays out.
pub struct LayoutCx<'a> {
    /// Document.
    pub store: &'a dyn TextStore,
    /// Font measurements.
    pub fonts: &'a dyn FontMetrics,
    /// View geometry.
    pub config: &'a DisplayConfig,
    /// Current metric epoch, stamped on every laid-out line.
    pub epoch: Epoch,
    layouts: Cell<usize>,
}

impl<'a> LayoutCx<'a> {
    /// Creates a context.
    pub fn new(
        store: &'a dyn TextStore,
        fonts: &'a dyn FontMetrics,
        config: &'a DisplayConfig,
        epoch: Epoch,
    ) -> Self {
        Self {
            store,
            fonts,
            config,
            epoch,
            layouts: Cell::new(0),
        }
    }

    /// Display lines laid out through this context so far.
    pub fn layouts(&self) -> usize {
        self.layouts.get()
    }
}

/// Where a display line starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStart {
    /// First byte of the display line.
    pub index: TextIndex,
    /// Position among the display lines of its logical line.
    pub display_line_no: usize,
    /// Rule applied where the previous display line broke.
    pub carry: Option<HyphenRule>,
}

impl LineStart {
    /// Start of a logical line.
    pub fn logical(line: usize) -> Self {
        Self {
            index: TextIndex::line_start(line),
            display_line_no: 0,
            carry: None,
        }
    }

    /// Start of the display line following `dline`.
    pub fn after(dline: &DLine) -> Self {
        if dline.flags.contains(DLineFlags::LOGICAL_LINE_END) {
            Self::logical(dline.index.line + 1)
        } else {
            Self {
                index: dline.end_index(),
                display_line_no: dline.display_line_no + 1,
                carry: dline.hyphen_rule,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnd {
    Open,
    Wrapped,
    Mandatory,
    Logical,
}

struct LineBuilder<'a, 'c> {
    cx: &'a LayoutCx<'c>,
    line: &'a LogicalLine,
    start: usize,
    style: StyleRef,
    wrap: WrapMode,
    max_x: i32,
    chunks: Vec<Chunk>,
    x: i32,
    consumed: usize,
    tabs: Vec<(usize, TabTarget)>,
    end: LineEnd,
    hyphen_rule: Option<HyphenRule>,
}

/// Lays out the display line starting at `start` into `dline`.
///
/// `dline` is reset first; its chunk allocation is reused.
pub fn layout_dline(cx: &LayoutCx<'_>, start: LineStart, dline: &mut DLine) {
    cx.layouts.set(cx.layouts.get() + 1);
    let mut chunks = std::mem::take(&mut dline.chunks);
    chunks.clear();
    dline.reset();
    dline.index = start.index;
    dline.display_line_no = start.display_line_no;
    dline.epoch = cx.epoch.get();

    let Some(line) = cx.store.line(start.index.line) else {
        dline.chunks = chunks;
        dline.flags = DLineFlags::LOGICAL_LINE_START | DLineFlags::LOGICAL_LINE_END;
        return;
    };
    let byte = start.index.byte.min(line.content_len());
    dline.index.byte = byte;

    let style = line
        .style_at(byte)
        .cloned()
        .unwrap_or_else(|| cx.store.default_style().clone());
    let lmargin = if start.display_line_no == 0 {
        style.lmargin1
    } else {
        style.lmargin2
    };
    let max_x = match style.wrap {
        WrapMode::None => i32::MAX,
        _ => (cx.config.width - style.rmargin).max(lmargin + 1),
    };

    let mut builder = LineBuilder {
        cx,
        line,
        start: byte,
        wrap: style.wrap,
        style,
        max_x,
        chunks,
        x: lmargin,
        consumed: 0,
        tabs: Vec::new(),
        end: LineEnd::Open,
        hyphen_rule: None,
    };
    if start.display_line_no > 0 {
        if let Some(rule) = start.carry {
            builder.carry_in(rule);
        }
    }
    builder.run();
    builder.finish(dline);
}

impl LineBuilder<'_, '_> {
    fn fonts(&self) -> &dyn FontMetrics {
        self.cx.fonts
    }

    fn pos(&self) -> usize {
        self.start + self.consumed
    }

    fn push(&mut self, mut chunk: Chunk) {
        if matches!(
            chunk.kind,
            ChunkKind::Char(_) | ChunkKind::Tab | ChunkKind::Hyphen { .. }
        ) {
            let (ascent, descent) = self.font_extents(&chunk.style);
            chunk.ascent = ascent;
            chunk.descent = descent;
        }
        chunk.byte_offset = self.consumed;
        self.consumed += chunk.byte_count;
        self.x = self.x.max(chunk.right());
        self.chunks.push(chunk);
    }

    fn font_extents(&self, style: &StyleRef) -> (i32, i32) {
        let ascent = self.fonts().ascent(style.font) + style.offset;
        let descent = self.fonts().descent(style.font) - style.offset;
        (ascent.max(0), descent.max(0))
    }

    /// Recomputes position and consumed bytes after chunks were dropped.
    fn resync(&mut self) {
        self.x = self.chunks.last().map_or(self.x, Chunk::right);
        self.consumed = self
            .chunks
            .last()
            .map_or(0, |c| c.byte_offset + c.byte_count);
        let n = self.chunks.len();
        self.tabs.retain(|&(idx, _)| idx < n);
    }

    /// Emits what a line following a spelling-change break starts with.
    fn carry_in(&mut self, rule: HyphenRule) {
        let line = self.line;
        let flat = line.flat_text();
        let Some(hyphen_at) = self.start.checked_sub(1) else {
            return;
        };
        if flat.as_bytes().get(hyphen_at) != Some(&(HYPHEN_PLACEHOLDER as u8)) {
            return;
        }
        let (Some(before), Some(after)) = (flat.get(..hyphen_at), flat.get(self.start..)) else {
            return;
        };
        let Some(prefix) = carry_prefix(rule, before, after) else {
            return;
        };
        if self.start + prefix.consumed > self.line.content_len() {
            return;
        }
        let style = self
            .line
            .style_at(self.start.saturating_sub(1))
            .cloned()
            .unwrap_or_else(|| self.style.clone());
        let width = self.fonts().text_width(style.font, &prefix.shown);
        let len = prefix.shown.len();
        let run = CharRun::new(Rc::from(prefix.shown), 0, len);
        let chunk = Chunk::new(ChunkKind::Char(run), style, self.x, width, prefix.consumed);
        self.push(chunk);
    }

    fn run(&mut self) {
        let line = self.line;
        self.walk_segments(line.segments(), false);
        if self.end == LineEnd::Wrapped && self.pos() == line.content_len() {
            // Nothing but the newline (and marks) is left: keep it here.
            self.end = LineEnd::Open;
            self.walk_segments(line.segments(), true);
        }
        if self.end == LineEnd::Open {
            self.push_newline();
            self.end = LineEnd::Logical;
        }
        if self.consumed == 0 {
            self.force_progress();
        }
    }

    fn walk_segments(&mut self, segments: &[Segment], marks_only: bool) {
        let mut seg_start = 0;
        for seg in segments {
            if self.end != LineEnd::Open {
                break;
            }
            let len = seg.byte_len();
            let pos = self.pos();
            let relevant = if len == 0 {
                seg_start >= pos
            } else {
                !marks_only && seg_start + len > pos
            };
            if relevant {
                self.layout_segment(seg, seg_start, pos.saturating_sub(seg_start));
            }
            seg_start += len;
        }
    }

    fn layout_segment(&mut self, seg: &Segment, seg_start: usize, from: usize) {
        if seg.style.elide {
            let len = seg.byte_len();
            if len > from {
                self.push_elided(len - from, &seg.style);
            }
            return;
        }
        match &seg.kind {
            SegmentKind::Text(text) => self.layout_text(text, &seg.style, seg_start, from),
            SegmentKind::Hyphen => {
                let mut chunk = Chunk::new(
                    ChunkKind::Hyphen { shown: None },
                    seg.style.clone(),
                    self.x,
                    0,
                    1,
                );
                if seg.style.hyphenate && self.wrap != WrapMode::None {
                    chunk.break_index = Some(1);
                }
                self.push(chunk);
            }
            SegmentKind::Image {
                name,
                width,
                height,
                ascent,
            } => {
                let kind = ChunkKind::Image { name: name.clone() };
                self.layout_object(kind, &seg.style, *width, *ascent, height - ascent);
            }
            SegmentKind::Window { name, width, height } => {
                let kind = ChunkKind::Window { name: name.clone() };
                self.layout_object(kind, &seg.style, *width, *height, 0);
            }
            SegmentKind::Mark { name, .. } => {
                if &**name == INSERT_MARK && self.cx.config.show_cursor {
                    let chunk = Chunk::new(ChunkKind::Cursor, seg.style.clone(), self.x, 0, 0);
                    self.push(chunk);
                }
            }
        }
    }

    fn push_elided(&mut self, bytes: usize, style: &StyleRef) {
        if let Some(last) = self.chunks.last_mut() {
            if matches!(last.kind, ChunkKind::Elided) {
                last.byte_count += bytes;
                self.consumed += bytes;
                return;
            }
        }
        let chunk = Chunk::new(ChunkKind::Elided, style.clone(), self.x, 0, bytes);
        self.push(chunk);
    }

    fn layout_object(&mut self, kind: ChunkKind, style: &StyleRef, width: i32, ascent: i32, descent: i32) {
        if self.wrap != WrapMode::None && self.x + width > self.max_x && self.consumed > 0 {
            self.end = LineEnd::Wrapped;
            return;
        }
        let mut chunk = Chunk::new(kind, style.clone(), self.x, width.max(0), 1);
        chunk.ascent = ascent.max(0);
        chunk.descent = descent.max(0);
        if self.wrap != WrapMode::None {
            chunk.break_index = Some(1);
        }
        self.push(chunk);
    }

    fn layout_tab(&mut self, style: &StyleRef) {
        if let Some(&(idx, target)) = self.tabs.last() {
            adjust_for_tab(&mut self.chunks, idx, target, self.cx.fonts);
            self.resync();
        }
        let line_style = self.style.clone();
        let default_width = default_tab_width(self.fonts(), line_style.font);
        let space_width = self.fonts().text_width(style.font, " ");
        let target = next_tab_stop(
            &line_style.tabs,
            line_style.tab_style,
            self.x,
            self.tabs.len(),
            default_width,
            space_width,
        );
        let mut width = match target.align {
            TabAlign::Left => (target.stop - self.x).max(0),
            _ => 0,
        };
        let overflows = self.wrap != WrapMode::None && self.x + width > self.max_x;
        if overflows {
            width = (self.max_x - self.x).max(0);
        }
        let mut chunk = Chunk::new(ChunkKind::Tab, style.clone(), self.x, width, 1);
        if self.wrap != WrapMode::None {
            chunk.break_index = Some(1);
        }
        let idx = self.chunks.len();
        self.push(chunk);
        self.tabs.push((idx, target));
        if overflows {
            self.end = LineEnd::Wrapped;
        }
    }

    fn layout_text(&mut self, text: &Rc<str>, style: &StyleRef, seg_start: usize, mut i: usize) {
        while i < text.len() && self.end == LineEnd::Open {
            if text.as_bytes()[i] == b'\t' {
                self.layout_tab(style);
                i += 1;
                continue;
            }
            let mut run_end = text[i..].find('\t').map_or(text.len(), |p| i + p);
            let mut mandatory = false;
            if self.wrap == WrapMode::Codepoint {
                let breaks = self.line.break_opportunities();
                if let Some(p) = (seg_start + i + 1..=seg_start + run_end)
                    .find(|&p| breaks[p] == BreakClass::Mandatory)
                {
                    run_end = p - seg_start;
                    mandatory = true;
                }
            }
            i = self.layout_run(text, style, seg_start, i, run_end);
            if mandatory && i == run_end && self.end == LineEnd::Open {
                self.end = LineEnd::Mandatory;
            }
        }
    }

    /// Lays out `text[i..end]` and returns where layout stopped.
    fn layout_run(&mut self, text: &Rc<str>, style: &StyleRef, seg_start: usize, i: usize, end: usize) -> usize {
        let fonts = self.cx.fonts;
        let slice = &text[i..end];
        let (fit, fit_width) = fit_prefix(fonts, style, slice, self.max_x - self.x);
        if fit == slice.len() {
            self.push_run(text, style, seg_start, i, end, fit_width);
            return end;
        }
        if self.wrap == WrapMode::None {
            let width = fonts.text_width(style.font, slice);
            self.push_run(text, style, seg_start, i, end, width);
            return end;
        }

        let over = i + fit;
        if self.wrap != WrapMode::Char {
            let rest = &text[over..end];
            let ws = rest.len() - rest.trim_start().len();
            if ws > 0 {
                // Whitespace at the overflow point hangs past the edge.
                let width = fit_width + fonts.text_width(style.font, &rest[..ws]);
                self.push_run(text, style, seg_start, i, over + ws, width);
                self.end = LineEnd::Wrapped;
                return over + ws;
            }
            let inner = match self.wrap {
                WrapMode::Codepoint => {
                    let breaks = self.line.break_opportunities();
                    (i + 1..=over)
                        .rev()
                        .find(|&p| breaks[seg_start + p] != BreakClass::NoBreak)
                }
                _ => last_word_break(&text[i..over]).map(|p| i + p),
            };
            if let Some(cut) = inner {
                let width = fonts.text_width(style.font, &text[i..cut]);
                self.push_run(text, style, seg_start, i, cut, width);
                self.end = LineEnd::Wrapped;
                return cut;
            }
            if self.backtrack() {
                return i;
            }
        }

        // Break between characters.
        let cut = if fit > 0 {
            over
        } else if self.consumed == 0 {
            i + slice.graphemes(true).next().map_or(slice.len(), str::len)
        } else {
            i
        };
        if cut > i {
            let width = fonts.text_width(style.font, &text[i..cut]);
            self.push_run(text, style, seg_start, i, cut, width);
        }
        self.end = LineEnd::Wrapped;
        cut
    }

    fn push_run(&mut self, text: &Rc<str>, style: &StyleRef, seg_start: usize, i: usize, end: usize, width: i32) {
        let mut chunk = Chunk::new(
            ChunkKind::Char(CharRun::new(text.clone(), i, end)),
            style.clone(),
            self.x,
            width,
            end - i,
        );
        chunk.break_index = match self.wrap {
            WrapMode::None => None,
            WrapMode::Char => Some(end - i),
            WrapMode::Word => last_word_break(&text[i..end]),
            WrapMode::Codepoint => {
                let breaks = self.line.break_opportunities();
                (i + 1..=end)
                    .rev()
                    .find(|&p| breaks[seg_start + p] != BreakClass::NoBreak)
                    .map(|p| p - i)
            }
        };
        self.push(chunk);
    }

    fn push_newline(&mut self) {
        let style = self
            .line
            .style_at(self.line.content_len())
            .cloned()
            .unwrap_or_else(|| self.cx.store.default_style().clone());
        if style.elide {
            self.push_elided(1, &style);
            return;
        }
        let mut run = CharRun::new(Rc::from("\n"), 0, 1);
        run.shown_end = 0;
        let chunk = Chunk::new(ChunkKind::Char(run), style, self.x, 0, 1);
        self.push(chunk);
    }

    /// Breaks the line at the latest earlier break opportunity.
    fn backtrack(&mut self) -> bool {
        for ci in (0..self.chunks.len()).rev() {
            let chunk = &self.chunks[ci];
            let Some(bi) = chunk.break_index else {
                continue;
            };
            if matches!(chunk.kind, ChunkKind::Hyphen { .. }) {
                if self.break_at_hyphen(ci) {
                    return true;
                }
                continue;
            }
            if chunk.byte_offset + bi == 0 {
                continue;
            }
            self.chunks.truncate(ci + 1);
            let fonts = self.cx.fonts;
            let chunk = &mut self.chunks[ci];
            if bi < chunk.byte_count {
                if let ChunkKind::Char(run) = &mut chunk.kind {
                    run.end = run.start + bi;
                    run.shown_end = run.end;
                    chunk.width = fonts.text_width(chunk.style.font, run.shown());
                }
                chunk.byte_count = bi;
            }
            self.resync();
            self.end = LineEnd::Wrapped;
            return true;
        }
        false
    }

    /// Ends the line at the soft hyphen chunk `ci` if the hyphenated form
    /// fits.
    fn break_at_hyphen(&mut self, ci: usize) -> bool {
        let fonts = self.cx.fonts;
        let hyphen = &self.chunks[ci];
        let style = hyphen.style.clone();
        let at = self.start + hyphen.byte_offset;
        let flat = self.line.flat_text();
        let (Some(before), Some(after)) = (flat.get(..at), flat.get(at + 1..)) else {
            return false;
        };
        let mut brk = hyphen_break(style.hyphen_rules, before, after);

        let mut drop_width = 0;
        if brk.drop_before > 0 {
            let droppable = ci
                .checked_sub(1)
                .map(|p| &self.chunks[p])
                .and_then(|prev| match &prev.kind {
                    ChunkKind::Char(run)
                        if prev.byte_offset + prev.byte_count == hyphen.byte_offset
                            && run.end - run.start == prev.byte_count
                            && run.shown_end - run.start >= brk.drop_before =>
                    {
                        let shown = run.shown();
                        shown
                            .get(shown.len() - brk.drop_before..)
                            .map(|tail| fonts.text_width(prev.style.font, tail))
                    }
                    _ => None,
                });
            match droppable {
                Some(width) => drop_width = width,
                None => {
                    brk = HyphenBreak {
                        rule: None,
                        drop_before: 0,
                        shown: "-".to_owned(),
                    }
                }
            }
        }

        let shown_width = fonts.text_width(style.font, &brk.shown);
        let x = hyphen.x - drop_width;
        if x + shown_width > self.max_x && ci > 0 {
            return false;
        }

        self.chunks.truncate(ci + 1);
        if brk.drop_before > 0 {
            let prev = &mut self.chunks[ci - 1];
            if let ChunkKind::Char(run) = &mut prev.kind {
                run.shown_end -= brk.drop_before;
            }
            prev.width -= drop_width;
        }
        let hyphen = &mut self.chunks[ci];
        hyphen.x = x;
        hyphen.width = shown_width;
        hyphen.kind = ChunkKind::Hyphen {
            shown: Some(Rc::from(brk.shown)),
        };
        self.hyphen_rule = brk.rule;
        self.resync();
        self.end = LineEnd::Wrapped;
        true
    }

    /// Consumes one unit of input when nothing else fit.
    fn force_progress(&mut self) {
        let pos = self.pos();
        tracing::debug!(
            target: "textdisp::layout",
            byte = pos,
            "forcing layout progress"
        );
        let content_len = self.line.content_len();
        if pos >= content_len {
            self.push_newline();
            self.end = LineEnd::Logical;
            return;
        }
        let line = self.line;
        let flat = line.flat_text();
        let unit = flat[pos..content_len]
            .graphemes(true)
            .next()
            .unwrap_or(&flat[pos..pos + 1]);
        let style = self
            .line
            .style_at(pos)
            .cloned()
            .unwrap_or_else(|| self.style.clone());
        let width = self.fonts().text_width(style.font, unit);
        let chunk = Chunk::new(
            ChunkKind::Char(CharRun::new(Rc::from(unit), 0, unit.len())),
            style,
            self.x,
            width,
            unit.len(),
        );
        self.push(chunk);
        self.end = LineEnd::Wrapped;
    }

    fn finish(mut self, dline: &mut DLine) {
        if let Some(&(idx, target)) = self.tabs.last() {
            adjust_for_tab(&mut self.chunks, idx, target, self.cx.fonts);
        }
        let logical_end = self.end == LineEnd::Logical;
        if !logical_end {
            while matches!(self.chunks.last().map(|c| &c.kind), Some(ChunkKind::Cursor)) {
                self.chunks.pop();
            }
        }

        let last_line = logical_end || self.end == LineEnd::Mandatory || self.wrap == WrapMode::None;
        if self.style.justify != Justify::Left {
            let right_edge = self.cx.config.width - self.style.rmargin;
            justify_line(&mut self.chunks, self.style.justify, right_edge, last_line, self.cx.fonts);
        }

        let mut flags = DLineFlags::empty();
        if dline.display_line_no == 0 {
            flags |= DLineFlags::LOGICAL_LINE_START;
        }
        if logical_end {
            flags |= DLineFlags::LOGICAL_LINE_END;
        }
        if self.end == LineEnd::Mandatory {
            flags |= DLineFlags::MANDATORY_BREAK;
        }
        if self.chunks.iter().any(|c| matches!(c.kind, ChunkKind::Cursor)) {
            flags |= DLineFlags::HAS_CURSOR;
        }

        let elided = self.chunks.iter().all(|c| matches!(c.kind, ChunkKind::Elided));
        if elided {
            flags |= DLineFlags::ELIDED;
        } else {
            let visible = self.chunks.iter().filter(|c| c.has_extent());
            let (ascent, descent) = visible.fold((0, 0), |(a, d), c| (a.max(c.ascent), d.max(c.descent)));
            let style = &self.style;
            dline.space_above = if dline.display_line_no == 0 {
                style.spacing1
            } else {
                (style.spacing2 + 1) / 2
            };
            dline.space_below = if logical_end {
                style.spacing3
            } else {
                style.spacing2 / 2
            };
            dline.baseline = dline.space_above + ascent;
            dline.height = dline.baseline + descent + dline.space_below;
        }

        dline.length = self.chunks.iter().map(Chunk::right).max().unwrap_or(0);
        dline.byte_count = self.consumed;
        dline.flags = flags;
        dline.hyphen_rule = if logical_end { None } else { self.hyphen_rule };
        dline.chunks = self.chunks;
        dline.build_sections();
    }
}

/// Longest grapheme prefix of `text` no wider than `avail`, and its width.
fn fit_prefix(fonts: &dyn FontMetrics, style: &StyleRef, text: &str, avail: i32) -> (usize, i32) {
    let full = fonts.text_width(style.font, text);
    if full <= avail {
        return (text.len(), full);
    }
    let mut width = 0;
    for (offset, g) in text.grapheme_indices(true) {
        let w = fonts.text_width(style.font, g);
        if width + w > avail {
            return (offset, width);
        }
        width += w;
    }
    (text.len(), width)
}

/// Offset just past the last whitespace run of `text`, if any.
fn last_word_break(text: &str) -> Option<usize> {
    text.char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(p, c)| p + c.len_utf8())
}

/// Finds the display line containing `index`.
///
/// Cached display-line arrays answer directly; otherwise the logical line is
/// laid out from its start (or from where a partial computation stopped)
/// until the display line holding `index` is found.
pub fn locate_display_line(cx: &LayoutCx<'_>, index: TextIndex) -> LineStart {
    let Some(line) = cx.store.line(index.line) else {
        return LineStart::logical(index.line);
    };
    let byte = index.byte.min(line.content_len());
    let info = line.pixel_info();
    let complete = cx.epoch.is_complete(info.epoch);
    let partial = cx.epoch.is_partial(info.epoch);

    let mut from = LineStart::logical(index.line);
    match info.disp.as_deref() {
        None if complete => return from,
        Some(disp) if complete || partial => {
            if complete || byte < disp.next_offset {
                let k = search_disp_line_entry(&disp.entries, byte);
                if let Some(entry) = disp.entries.get(k) {
                    return LineStart {
                        index: TextIndex::new(index.line, entry.byte_offset),
                        display_line_no: k,
                        carry: disp.carry_into(k),
                    };
                }
            } else if let Some(last) = disp.entries.last() {
                from = LineStart {
                    index: TextIndex::new(index.line, disp.next_offset),
                    display_line_no: disp.entries.len(),
                    carry: last.hyphen_rule,
                };
            }
        }
        _ => {}
    }

    let mut scratch = DLine::default();
    loop {
        layout_dline(cx, from, &mut scratch);
        if scratch.flags.contains(DLineFlags::LOGICAL_LINE_END)
            || byte < scratch.index.byte + scratch.byte_count
        {
            return from;
        }
        from = LineStart::after(&scratch);
    }
}
