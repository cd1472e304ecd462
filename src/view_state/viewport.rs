//! The live window of display lines and its redisplay.
//!
//! A display line lives in exactly one place: the visible list, the
//! short-term cache, the saved list, the metric temp slot, or the arena's
//! free pool. [`DisplayState::update_display_info`] rebuilds the visible list
//! for the current top position, reusing lines whose index and epoch still
//! match and laying out the rest. [`DisplayState::display`] then draws what
//! changed, moving unchanged lines with a single block copy when the view
//! scrolled.

use crate::display::{layout_line, record_metrics, DisplayState};
use crate::host::{Canvas, HostEvent};
use crate::layout::chunk::{Chunk, ChunkKind};
use crate::layout::dline::{DLine, DLineArena, DLineFlags, DLineId};
use crate::layout::engine::LineStart;
use crate::model::font::FontMetrics;
use crate::model::index::TextIndex;
use crate::model::store::TextStore;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Maximum number of off-screen lines kept for reuse.
pub const CACHE_SIZE: usize = 8;

/// Maximum number of metric layouts parked for the next redisplay.
const MAX_SAVED: usize = 32;

/// Display lines covering the view, plus the lists lines move between.
#[derive(Debug)]
pub struct Viewport {
    pub(crate) arena: DLineArena,
    pub(crate) lines: Vec<DLineId>,
    pub(crate) cache: VecDeque<DLineId>,
    pub(crate) saved: Vec<DLineId>,
    pub(crate) metric_temp: Option<DLineId>,
    pub(crate) top: TextIndex,
    pub(crate) top_offset: i32,
    pub(crate) x_offset: i32,
    pub(crate) max_length: i32,
    pub(crate) last_line: usize,
    pub(crate) layout_pending: bool,
    pub(crate) redraw_all: bool,
    pub(crate) drawn_bottom: i32,
    pub(crate) undisplay: Vec<Chunk>,
    pub(crate) last_yview: Option<(f64, f64)>,
    pub(crate) last_xview: Option<(f64, f64)>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    /// Empty viewport at the top of the document, waiting for its first
    /// layout.
    pub fn new() -> Self {
        Self {
            arena: DLineArena::new(),
            lines: Vec::new(),
            cache: VecDeque::new(),
            saved: Vec::new(),
            metric_temp: None,
            top: TextIndex::default(),
            top_offset: 0,
            x_offset: 0,
            max_length: 0,
            last_line: 0,
            layout_pending: true,
            redraw_all: true,
            drawn_bottom: 0,
            undisplay: Vec::new(),
            last_yview: None,
            last_xview: None,
        }
    }

    /// Start of the topmost display line.
    pub fn top(&self) -> TextIndex {
        self.top
    }

    /// Pixels of the top display line scrolled out above the view.
    pub fn top_offset(&self) -> i32 {
        self.top_offset
    }

    /// Horizontal scroll in pixels.
    pub fn x_offset(&self) -> i32 {
        self.x_offset
    }

    /// Returns true if the visible list must be rebuilt before it is used.
    pub fn is_layout_pending(&self) -> bool {
        self.layout_pending
    }

    /// Visible display lines, top to bottom.
    pub fn visible(&self) -> impl Iterator<Item = &DLine> + '_ {
        self.lines.iter().map(|&id| self.arena.get(id))
    }

    /// Number of lines in the short-term cache.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Number of parked metric layouts.
    pub fn saved(&self) -> usize {
        self.saved.len()
    }

    /// Number of display lines allocated from the arena.
    pub fn live(&self) -> usize {
        self.arena.live()
    }

    pub(crate) fn take_metric_temp(&mut self) -> DLineId {
        match self.metric_temp.take() {
            Some(id) => id,
            None => self.arena.alloc(),
        }
    }

    pub(crate) fn return_metric_temp(&mut self, id: DLineId) {
        match self.metric_temp {
            Some(_) => self.arena.free(id),
            None => self.metric_temp = Some(id),
        }
    }

    /// Returns true if a pending redisplay will need `dline`.
    pub(crate) fn wants(&self, dline: &DLine) -> bool {
        let bottom = if self.lines.is_empty() {
            self.top.line + MAX_SAVED
        } else {
            self.last_line.max(self.top.line)
        };
        self.layout_pending && self.saved.len() < MAX_SAVED && dline.index >= self.top && dline.index.line <= bottom
    }

    pub(crate) fn invalidate_all(&mut self) {
        self.layout_pending = true;
        self.redraw_all = true;
    }

    /// Takes `id` off the screen: windows it placed get unmapped on the next
    /// draw.
    fn retire(&mut self, id: DLineId) {
        let dline = self.arena.get_mut(id);
        if dline.flags.contains(DLineFlags::DISPLAYED) {
            self.undisplay.extend(
                dline
                    .chunks
                    .iter()
                    .filter(|c| matches!(c.kind, ChunkKind::Window { .. }))
                    .cloned(),
            );
            dline.flags.remove(DLineFlags::DISPLAYED);
        }
        dline.old_y = None;
    }

    pub(crate) fn release(&mut self, id: DLineId) {
        self.retire(id);
        self.arena.free(id);
    }

    fn stash(&mut self, id: DLineId) {
        self.retire(id);
        self.cache.push_back(id);
        if self.cache.len() > CACHE_SIZE {
            if let Some(old) = self.cache.pop_front() {
                self.arena.free(old);
            }
        }
    }

    /// Releases every held line for which `stale` holds and renumbers the
    /// rest with `shift`.
    fn unlink(&mut self, stale: impl Fn(usize) -> bool, shift: impl Fn(usize) -> usize) {
        let mut doomed = Vec::new();
        let lists = [
            std::mem::take(&mut self.lines),
            std::mem::take(&mut self.cache).into(),
            std::mem::take(&mut self.saved),
        ];
        let mut kept: [Vec<DLineId>; 3] = Default::default();
        for (list, out) in lists.into_iter().zip(kept.iter_mut()) {
            for id in list {
                let dline = self.arena.get_mut(id);
                if stale(dline.index.line) {
                    doomed.push(id);
                } else {
                    dline.index.line = shift(dline.index.line);
                    out.push(id);
                }
            }
        }
        let [lines, cache, saved] = kept;
        self.lines = lines;
        self.cache = cache.into();
        self.saved = saved;
        for id in doomed {
            self.release(id);
        }
        self.layout_pending = true;
    }

    /// Drops lines laid out from `first..=last`, whose content changed.
    pub(crate) fn lines_changed(&mut self, first: usize, last: usize) {
        self.unlink(|line| (first..=last).contains(&line), |line| line);
    }

    /// Renumbers lines after `count` lines were inserted after `first`.
    pub(crate) fn lines_inserted(&mut self, first: usize, count: usize) {
        self.unlink(
            |line| line == first,
            |line| if line > first { line + count } else { line },
        );
        if self.top.line > first {
            self.top.line += count;
        }
    }

    /// Renumbers lines after the `count` lines following `first` were
    /// joined into it.
    pub(crate) fn lines_deleted(&mut self, first: usize, count: usize) {
        let last = first + count;
        self.unlink(
            |line| (first..=last).contains(&line),
            |line| if line > last { line - count } else { line },
        );
        if self.top.line > last {
            self.top.line -= count;
        } else if self.top.line > first {
            self.top = TextIndex::line_start(first);
            self.top_offset = 0;
        }
    }
}

impl DisplayState {
    /// Rebuilds the visible list for the current top position.
    ///
    /// Lines already laid out for the same start and epoch are reused from
    /// the old visible list, the short-term cache or the saved list;
    /// everything else is laid out again. Blank space below the end of the
    /// document is filled by moving the top up. Does nothing unless the
    /// viewport was invalidated.
    pub fn update_display_info(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics) {
        if !self.view.layout_pending {
            return;
        }
        let line_count = store.line_count();
        if self.view.top.line >= line_count {
            self.view.top = TextIndex::line_start(line_count.saturating_sub(1));
            self.view.top_offset = 0;
        }
        self.view.top_offset = self.view.top_offset.max(0);

        let mut candidates = std::mem::take(&mut self.view.lines);
        let mut lines = Vec::new();
        let height = self.config.height;
        let mut pulled_up = false;
        let mut y;
        loop {
            let mut start = self.locate(store, fonts, self.view.top);
            self.view.top = start.index;
            y = -self.view.top_offset;
            let mut seen_visible = false;
            while y < height && start.index.line < line_count {
                let id = self.acquire_line(store, fonts, start, &mut candidates);
                let dline = self.view.arena.get_mut(id);
                if !seen_visible && dline.height > 0 {
                    seen_visible = true;
                    if y + dline.height <= 0 {
                        self.view.top_offset = 0;
                        y = 0;
                    }
                }
                dline.y = y;
                dline.flags.remove(DLineFlags::TOP_LINE | DLineFlags::BOTTOM_LINE);
                y += dline.height;
                start = LineStart::after(dline);
                lines.push(id);
            }

            let spare = height - y;
            let at_start = self.view.top == TextIndex::default() && self.view.top_offset == 0;
            if spare <= 0 || at_start || pulled_up {
                break;
            }
            pulled_up = true;
            trace!(target: "textdisp::view", spare, "filling blank space below document end");
            candidates.append(&mut lines);
            if spare <= self.view.top_offset {
                self.view.top_offset -= spare;
            } else {
                let top = self.locate(store, fonts, self.view.top);
                let (start, offset) = self.measure_up(store, fonts, top, spare - self.view.top_offset);
                self.view.top = start.index;
                self.view.top_offset = offset;
            }
        }

        for id in candidates {
            self.view.stash(id);
        }
        for id in std::mem::take(&mut self.view.saved) {
            self.view.arena.free(id);
        }

        if let Some(&first) = lines.first() {
            self.view.arena.get_mut(first).flags.insert(DLineFlags::TOP_LINE);
        }
        if let Some(&last) = lines.last() {
            let dline = self.view.arena.get_mut(last);
            dline.flags.insert(DLineFlags::BOTTOM_LINE);
            self.view.last_line = dline.index.line;
        }
        self.view.max_length = lines
            .iter()
            .map(|&id| self.view.arena.get(id).length)
            .max()
            .unwrap_or(0);
        self.view.lines = lines;
        self.view.layout_pending = false;
        debug!(
            target: "textdisp::view",
            top = %self.view.top,
            top_offset = self.view.top_offset,
            lines = self.view.lines.len(),
            "display info updated"
        );

        self.report_yview(store, fonts);
        self.report_xview();
    }

    /// Finds a line for `start`: a reusable one with the same start and
    /// epoch, or a fresh layout.
    fn acquire_line(
        &mut self,
        store: &mut dyn TextStore,
        fonts: &dyn FontMetrics,
        start: LineStart,
        candidates: &mut Vec<DLineId>,
    ) -> DLineId {
        let epoch = self.epoch.get();
        let arena = &self.view.arena;
        let matches = |id: &DLineId| {
            let d = arena.get(*id);
            d.index == start.index && d.display_line_no == start.display_line_no && d.epoch == epoch
        };
        let reused = if let Some(pos) = candidates.iter().position(&matches) {
            Some(candidates.swap_remove(pos))
        } else if let Some(pos) = self.view.cache.iter().position(&matches) {
            self.view.cache.remove(pos)
        } else if let Some(pos) = self.view.saved.iter().position(&matches) {
            Some(self.view.saved.swap_remove(pos))
        } else {
            None
        };
        if let Some(id) = reused {
            self.stats.reused += 1;
            return id;
        }

        let id = self.view.arena.alloc();
        let dline = self.view.arena.get_mut(id);
        layout_line(&self.config, self.epoch, &mut self.stats, &*store, fonts, start, dline);
        record_metrics(store, &mut self.stale, self.epoch, &mut self.stats, self.view.arena.get(id));
        id
    }

    /// Draws the visible lines that changed since the last call.
    ///
    /// Lines that only moved vertically are shifted with one block copy when
    /// their old and new positions overlap the view; the uncovered rest is
    /// cleared and redrawn.
    pub fn display(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, canvas: &mut dyn Canvas) {
        self.update_display_info(store, fonts);
        for chunk in self.view.undisplay.drain(..) {
            chunk.undisplay(canvas);
        }

        let height = self.config.height;
        if self.view.redraw_all {
            canvas.clear(0, height);
            for &id in &self.view.lines {
                let dline = self.view.arena.get_mut(id);
                dline.flags.remove(DLineFlags::DISPLAYED);
                dline.old_y = None;
            }
        } else {
            self.copy_moved_lines(canvas);
        }

        let mut bottom = 0;
        for &id in &self.view.lines {
            let dline = self.view.arena.get_mut(id);
            bottom = dline.y + dline.height;
            let current = dline.flags.contains(DLineFlags::DISPLAYED) && dline.old_y == Some(dline.y);
            if current || dline.height == 0 {
                continue;
            }
            if !self.view.redraw_all {
                canvas.clear(dline.y, dline.height);
            }
            draw_line(dline, canvas, fonts, self.view.x_offset, self.config.insert_width);
            dline.flags.insert(DLineFlags::DISPLAYED);
            dline.old_y = Some(dline.y);
        }
        let bottom = bottom.clamp(0, height);
        if !self.view.redraw_all && bottom < self.view.drawn_bottom {
            canvas.clear(bottom, self.view.drawn_bottom - bottom);
        }
        self.view.drawn_bottom = bottom;
        self.view.redraw_all = false;
    }

    /// Shifts the first run of displayed lines that moved by the same
    /// distance with one block copy.
    fn copy_moved_lines(&mut self, canvas: &mut dyn Canvas) {
        let height = self.config.height;
        let arena = &self.view.arena;
        let moved = |id: DLineId| {
            let d = arena.get(id);
            match d.old_y {
                Some(old) if d.flags.contains(DLineFlags::DISPLAYED) && old != d.y => Some(d.y - old),
                _ => None,
            }
        };
        let Some(first) = self.view.lines.iter().position(|&id| moved(id).is_some()) else {
            return;
        };
        let Some(delta) = moved(self.view.lines[first]) else {
            return;
        };
        let run_len = self.view.lines[first..]
            .iter()
            .take_while(|&&id| moved(id) == Some(delta))
            .count();
        let run = &self.view.lines[first..first + run_len];
        let top = arena.get(run[0]).y;
        let last = arena.get(run[run_len - 1]);
        let bottom = last.y + last.height;

        let lo = top.max(0).max(delta);
        let hi = bottom.min(height).min(height + delta);
        if hi <= lo {
            return;
        }
        canvas.copy_area(lo - delta, lo, hi - lo);
        self.stats.copies += 1;
        debug!(target: "textdisp::view", src = lo - delta, dst = lo, height = hi - lo, "block copy");
        for &id in run {
            let dline = self.view.arena.get_mut(id);
            if dline.y >= lo && dline.y + dline.height <= hi {
                dline.old_y = Some(dline.y);
            }
        }
    }

    pub(crate) fn report_yview(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics) {
        let view = self.yview(store, fonts);
        if self.view.last_yview != Some(view) {
            self.view.last_yview = Some(view);
            self.push_event(HostEvent::YView {
                first: view.0,
                last: view.1,
            });
        }
    }

    pub(crate) fn report_xview(&mut self) {
        let view = self.xview();
        if self.view.last_xview != Some(view) {
            self.view.last_xview = Some(view);
            self.push_event(HostEvent::XView {
                first: view.0,
                last: view.1,
            });
        }
    }
}

fn draw_line(dline: &DLine, canvas: &mut dyn Canvas, fonts: &dyn FontMetrics, x_offset: i32, cursor_width: i32) {
    let top = dline.y + dline.space_above;
    let baseline = dline.y + dline.baseline;
    let line_height = dline.height - dline.space_above - dline.space_below;
    for chunk in &dline.chunks {
        chunk.display(canvas, fonts, x_offset, top, baseline, line_height, cursor_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;
    use crate::host::{DrawOp, RecordingCanvas};
    use crate::model::buffer::TextBuffer;
    use crate::model::font::CellMetrics;
    use crate::model::segment::Segment;
    use crate::model::style::Style;

    fn numbered(lines: usize) -> String {
        (0..lines).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    fn setup(text: &str, height: i32) -> (TextBuffer, CellMetrics, DisplayState) {
        let buffer = TextBuffer::from_text(text, Style::default().shared(), 20);
        let fonts = CellMetrics::new(10, 20);
        let state = DisplayState::new(DisplayConfig::new(200, height), buffer.line_count());
        (buffer, fonts, state)
    }

    fn tops(state: &DisplayState) -> Vec<(usize, i32)> {
        state.viewport().visible().map(|d| (d.index.line, d.y)).collect()
    }

    #[test]
    fn fills_view_from_top() {
        let (mut buffer, fonts, mut state) = setup(&numbered(50), 100);
        state.update_display_info(&mut buffer, &fonts);
        assert_eq!(tops(&state), vec![(0, 0), (1, 20), (2, 40), (3, 60), (4, 80)]);
        assert!(!state.viewport().is_layout_pending());
    }

    #[test]
    fn partial_bottom_line_is_included() {
        let (mut buffer, fonts, mut state) = setup(&numbered(50), 90);
        state.update_display_info(&mut buffer, &fonts);
        assert_eq!(state.viewport().visible().count(), 5);
        let last = state.viewport().visible().last().expect("lines");
        assert!(last.flags.contains(DLineFlags::BOTTOM_LINE));
    }

    #[test]
    fn unchanged_lines_are_reused() {
        let (mut buffer, fonts, mut state) = setup(&numbered(50), 100);
        state.update_display_info(&mut buffer, &fonts);
        let layouts = state.stats().layouts;
        state.view.layout_pending = true;
        state.update_display_info(&mut buffer, &fonts);
        assert_eq!(state.stats().layouts, layouts);
        assert_eq!(state.stats().reused, 5);
    }

    #[test]
    fn blank_space_at_end_moves_top_up() {
        let (mut buffer, fonts, mut state) = setup(&numbered(10), 100);
        state.view.top = TextIndex::line_start(8);
        state.view.layout_pending = true;
        state.update_display_info(&mut buffer, &fonts);
        assert_eq!(state.viewport().top(), TextIndex::line_start(5));
        assert_eq!(tops(&state).last(), Some(&(9, 80)));
    }

    #[test]
    fn short_document_stays_at_top() {
        let (mut buffer, fonts, mut state) = setup("a\nb", 100);
        state.update_display_info(&mut buffer, &fonts);
        assert_eq!(tops(&state), vec![(0, 0), (1, 20)]);
    }

    #[test]
    fn edited_line_is_laid_out_again() {
        let (mut buffer, fonts, mut state) = setup(&numbered(10), 100);
        state.update_display_info(&mut buffer, &fonts);
        let layouts = state.stats().layouts;
        buffer.insert_text(TextIndex::new(2, 0), "x").expect("insert");
        state.invalidate_lines(&mut buffer, 2, 2);
        state.update_display_info(&mut buffer, &fonts);
        assert_eq!(state.stats().layouts, layouts + 1);
    }

    #[test]
    fn inserted_lines_shift_reused_lines() {
        let (mut buffer, fonts, mut state) = setup(&numbered(10), 100);
        state.update_display_info(&mut buffer, &fonts);
        let summary = buffer.insert_text(TextIndex::new(1, 0), "new\n").expect("insert");
        state.lines_inserted(&mut buffer, summary.first_line, summary.lines_added);
        state.update_display_info(&mut buffer, &fonts);
        let lines: Vec<usize> = state.viewport().visible().map(|d| d.index.line).collect();
        assert_eq!(lines, vec![0, 1, 2, 3, 4]);
        assert_eq!(buffer.line_text(2), "line 1");
    }

    #[test]
    fn first_display_draws_every_line() {
        let (mut buffer, fonts, mut state) = setup(&numbered(10), 60);
        let mut canvas = RecordingCanvas::default();
        state.display(&mut buffer, &fonts, &mut canvas);
        assert_eq!(canvas.texts(), vec!["line 0", "line 1", "line 2"]);

        let mut again = RecordingCanvas::default();
        state.display(&mut buffer, &fonts, &mut again);
        assert!(again.ops.is_empty(), "nothing changed: {:?}", again.ops);
    }

    #[test]
    fn scrolling_copies_overlapping_lines() {
        let (mut buffer, fonts, mut state) = setup(&numbered(20), 100);
        let mut canvas = RecordingCanvas::default();
        state.display(&mut buffer, &fonts, &mut canvas);

        state.scroll_lines(&mut buffer, &fonts, 2);
        let mut canvas = RecordingCanvas::default();
        state.display(&mut buffer, &fonts, &mut canvas);

        assert_eq!(canvas.copies(), vec![(40, 0, 60)]);
        assert_eq!(canvas.texts(), vec!["line 5", "line 6"]);
        assert_eq!(state.stats().copies, 1);
    }

    #[test]
    fn windows_scrolled_out_are_unmapped() {
        let (mut buffer, fonts, mut state) = setup(&numbered(20), 40);
        let style = Style::default().shared();
        buffer
            .insert_segment(TextIndex::new(0, 0), Segment::window("w", 10, 10, style))
            .expect("window");
        state.invalidate_lines(&mut buffer, 0, 0);
        let mut canvas = RecordingCanvas::default();
        state.display(&mut buffer, &fonts, &mut canvas);
        assert!(canvas.ops.iter().any(|op| matches!(op, DrawOp::Window { .. })));

        state.scroll_lines(&mut buffer, &fonts, 5);
        let mut canvas = RecordingCanvas::default();
        state.display(&mut buffer, &fonts, &mut canvas);
        assert!(canvas.ops.contains(&DrawOp::Unmap { name: "w".into() }));
    }

    #[test]
    fn cache_is_bounded() {
        let (mut buffer, fonts, mut state) = setup(&numbered(200), 100);
        for _ in 0..10 {
            state.scroll_lines(&mut buffer, &fonts, 5);
        }
        assert!(state.viewport().cached() <= CACHE_SIZE);
        assert_eq!(state.viewport().saved(), 0);
    }
}
