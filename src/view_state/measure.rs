//! Vertical distances between display lines.
//!
//! When every line's metrics are current the cumulative pixel index of the
//! store answers in O(log n). Otherwise the walk goes line by line, taking
//! cached heights where they are current and laying out (and caching) the
//! rest.

use crate::display::{layout_line, record_metrics, DisplayState};
use crate::layout::dline::DLineFlags;
use crate::layout::engine::{locate_display_line, LayoutCx, LineStart};
use crate::model::font::FontMetrics;
use crate::model::index::TextIndex;
use crate::model::store::TextStore;

impl DisplayState {
    /// Start of the display line holding `index`.
    pub fn locate(&mut self, store: &dyn TextStore, fonts: &dyn FontMetrics, index: TextIndex) -> LineStart {
        let cx = LayoutCx::new(store, fonts, &self.config, self.epoch);
        let start = locate_display_line(&cx, index);
        self.stats.layouts += cx.layouts();
        start
    }

    /// Starts and heights of every display line of logical line `line`.
    ///
    /// Current metrics answer from the cache; otherwise the line is laid out
    /// from its start and its metrics are recorded on the way.
    pub fn display_lines_of(
        &mut self,
        store: &mut dyn TextStore,
        fonts: &dyn FontMetrics,
        line: usize,
    ) -> Vec<(LineStart, i32)> {
        let epoch = self.epoch;
        let Some(info) = store.pixel_info(line) else {
            return Vec::new();
        };
        if epoch.is_complete(info.epoch) {
            return match info.disp.as_deref() {
                None => vec![(LineStart::logical(line), info.height as i32)],
                Some(disp) => disp
                    .entries
                    .iter()
                    .enumerate()
                    .map(|(k, e)| {
                        let start = LineStart {
                            index: TextIndex::new(line, e.byte_offset),
                            display_line_no: k,
                            carry: disp.carry_into(k),
                        };
                        (start, e.height)
                    })
                    .collect(),
            };
        }

        let id = self.view.take_metric_temp();
        let mut out = Vec::new();
        let mut start = LineStart::logical(line);
        loop {
            let dline = self.view.arena.get_mut(id);
            layout_line(&self.config, epoch, &mut self.stats, &*store, fonts, start, dline);
            let dline = self.view.arena.get(id);
            record_metrics(store, &mut self.stale, epoch, &mut self.stats, dline);
            out.push((start, dline.height));
            if dline.flags.contains(DLineFlags::LOGICAL_LINE_END) {
                break;
            }
            start = LineStart::after(dline);
        }
        self.view.return_metric_temp(id);
        out
    }

    /// Document pixel offset of the top of the display line at `start`.
    pub fn doc_y(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, start: LineStart) -> usize {
        if start.display_line_no == 0 {
            return store.pixel_offset_of_line(start.index.line);
        }
        let above: i32 = self
            .display_lines_of(store, fonts, start.index.line)
            .iter()
            .filter(|(s, _)| s.display_line_no < start.display_line_no)
            .map(|(_, h)| *h)
            .sum();
        store.pixel_offset_of_line(start.index.line) + above.max(0) as usize
    }

    /// The display line covering document pixel `y` and the offset of `y`
    /// inside it. Offsets past the end map to the last display line.
    pub fn position_at_pixel(
        &mut self,
        store: &mut dyn TextStore,
        fonts: &dyn FontMetrics,
        y: usize,
    ) -> (LineStart, i32) {
        let total = store.total_pixels();
        if total == 0 {
            return (LineStart::logical(0), 0);
        }
        let (line, line_top) = store.line_at_pixel(y.min(total - 1));
        let within = (y.min(total - 1) - line_top) as i32;
        let mut acc = 0;
        let mut last = LineStart::logical(line);
        for (start, h) in self.display_lines_of(store, fonts, line) {
            if h <= 0 {
                continue;
            }
            last = start;
            if within < acc + h {
                return (start, within - acc);
            }
            acc += h;
        }
        (last, 0)
    }

    /// The position `distance` pixels above the top of display line `from`,
    /// as a display line and an offset into it. Stops at the start of the
    /// document.
    pub fn measure_up(
        &mut self,
        store: &mut dyn TextStore,
        fonts: &dyn FontMetrics,
        from: LineStart,
        distance: i32,
    ) -> (LineStart, i32) {
        if distance < 0 {
            return self.measure_down(store, fonts, from, -distance);
        }
        if distance == 0 {
            return (from, 0);
        }
        if self.stale.is_empty() {
            let y = self.doc_y(store, fonts, from);
            return self.position_at_pixel(store, fonts, y.saturating_sub(distance as usize));
        }

        let mut remaining = distance;
        let mut line = from.index.line;
        let mut above: Vec<(LineStart, i32)> = self
            .display_lines_of(store, fonts, line)
            .into_iter()
            .filter(|(s, _)| s.display_line_no < from.display_line_no)
            .collect();
        loop {
            while let Some((start, h)) = above.pop() {
                if h <= 0 {
                    continue;
                }
                if remaining <= h {
                    return (start, h - remaining);
                }
                remaining -= h;
            }
            if line == 0 {
                return (LineStart::logical(0), 0);
            }
            line -= 1;
            above = self.display_lines_of(store, fonts, line);
        }
    }

    /// The position `distance` pixels below the top of display line `from`.
    /// Stops at the last display line of the document.
    pub fn measure_down(
        &mut self,
        store: &mut dyn TextStore,
        fonts: &dyn FontMetrics,
        from: LineStart,
        distance: i32,
    ) -> (LineStart, i32) {
        if distance < 0 {
            return self.measure_up(store, fonts, from, -distance);
        }
        if self.stale.is_empty() {
            let y = self.doc_y(store, fonts, from) + distance as usize;
            if y < store.total_pixels() {
                return self.position_at_pixel(store, fonts, y);
            }
        }

        let line_count = store.line_count();
        let mut remaining = distance;
        let mut line = from.index.line;
        let mut last_visible = from;
        let mut lines: Vec<(LineStart, i32)> = self
            .display_lines_of(store, fonts, line)
            .into_iter()
            .filter(|(s, _)| s.display_line_no >= from.display_line_no)
            .collect();
        loop {
            for (start, h) in lines {
                if h <= 0 {
                    continue;
                }
                last_visible = start;
                if remaining < h {
                    return (start, remaining);
                }
                remaining -= h;
            }
            line += 1;
            if line >= line_count {
                return (last_visible, 0);
            }
            lines = self.display_lines_of(store, fonts, line);
        }
    }
}
