//! Vertical and horizontal scrolling.
//!
//! The view position is a display-line start plus the number of pixels of
//! that line scrolled out above the view. Every operation here moves that
//! position and then rebuilds the visible list, which also clamps the view
//! against the end of the document.

use crate::display::DisplayState;
use crate::layout::engine::LineStart;
use crate::model::font::FontMetrics;
use crate::model::index::TextIndex;
use crate::model::store::TextStore;
use tracing::debug;

/// Unit of a horizontal scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollUnit {
    /// Average character widths.
    Units,
    /// Most of the view width.
    Pages,
}

impl DisplayState {
    fn move_top(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, start: LineStart, offset: i32) {
        self.view.top = start.index;
        self.view.top_offset = offset.max(0);
        self.view.layout_pending = true;
        self.update_display_info(store, fonts);
    }

    fn top_start(&mut self, store: &dyn TextStore, fonts: &dyn FontMetrics) -> LineStart {
        self.locate(store, fonts, self.view.top)
    }

    /// Puts the display line holding `index` at the top of the view, with
    /// `offset` pixels of it scrolled out above.
    pub fn set_yview(
        &mut self,
        store: &mut dyn TextStore,
        fonts: &dyn FontMetrics,
        index: TextIndex,
        offset: i32,
    ) {
        let start = self.locate(store, fonts, index);
        debug!(target: "textdisp::view", %index, offset, "set yview");
        self.move_top(store, fonts, start, offset);
    }

    /// Scrolls by `count` display lines; negative scrolls up.
    pub fn scroll_lines(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, count: i32) {
        let top = self.top_start(store, fonts);
        if count >= 0 {
            let line_count = store.line_count();
            let mut remaining = count;
            let mut target = top;
            let mut line = top.index.line;
            'walk: while remaining > 0 && line < line_count {
                for (start, h) in self.display_lines_of(store, fonts, line) {
                    if h <= 0 || (line == top.index.line && start.display_line_no <= top.display_line_no) {
                        continue;
                    }
                    target = start;
                    remaining -= 1;
                    if remaining == 0 {
                        break 'walk;
                    }
                }
                line += 1;
            }
            self.move_top(store, fonts, target, 0);
        } else {
            let mut remaining = -count;
            if self.view.top_offset > 0 {
                remaining -= 1;
            }
            let mut target = top;
            let mut line = top.index.line;
            let mut above: Vec<(LineStart, i32)> = self
                .display_lines_of(store, fonts, line)
                .into_iter()
                .filter(|(s, _)| s.display_line_no < top.display_line_no)
                .collect();
            'walk: while remaining > 0 {
                while let Some((start, h)) = above.pop() {
                    if h <= 0 {
                        continue;
                    }
                    target = start;
                    remaining -= 1;
                    if remaining == 0 {
                        break 'walk;
                    }
                }
                if line == 0 {
                    break;
                }
                line -= 1;
                above = self.display_lines_of(store, fonts, line);
            }
            self.move_top(store, fonts, target, 0);
        }
    }

    /// Scrolls by `pixels`; negative scrolls up.
    pub fn scroll_pixels(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, pixels: i32) {
        let top = self.top_start(store, fonts);
        let offset = self.view.top_offset;
        let (start, offset) = if pixels >= 0 {
            self.measure_down(store, fonts, top, offset + pixels)
        } else if -pixels <= offset {
            (top, offset + pixels)
        } else {
            self.measure_up(store, fonts, top, -pixels - offset)
        };
        self.move_top(store, fonts, start, offset);
    }

    /// Scrolls by `count` pages. A page is the view height less two lines
    /// of the default font, so consecutive pages overlap.
    pub fn scroll_pages(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, count: i32) {
        let font = store.default_style().font;
        let line = fonts.line_height(font).max(1);
        let page = (self.config.height - 2 * line).max(line);
        self.scroll_pixels(store, fonts, count.saturating_mul(page));
    }

    /// Fractions of the document height above the view and at its bottom.
    pub fn yview(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics) -> (f64, f64) {
        let total = store.total_pixels();
        if total == 0 {
            return (0.0, 1.0);
        }
        let top = self.top_start(store, fonts);
        let first = self.doc_y(store, fonts, top) + self.view.top_offset.max(0) as usize;
        let last = first + self.config.height.max(0) as usize;
        let total = total as f64;
        ((first as f64 / total).min(1.0), (last as f64 / total).min(1.0))
    }

    /// Scrolls so that `fraction` of the document height lies above the
    /// view.
    ///
    /// Only the logical line at the target position is laid out before the
    /// view is rebuilt; heights of lines never laid out are estimates until
    /// the metric scheduler reaches them.
    pub fn yview_moveto(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, fraction: f64) {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let y = (fraction * store.total_pixels() as f64).round() as usize;
        let (start, offset) = self.position_at_pixel(store, fonts, y);
        debug!(target: "textdisp::view", fraction, y, top = %start.index, "yview moveto");
        self.move_top(store, fonts, start, offset);
    }

    /// Scrolls the least amount needed to show `index`: lines just outside
    /// the view are scrolled in at the nearest edge, lines far away are
    /// centred.
    pub fn see(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, index: TextIndex) {
        self.update_display_info(store, fonts);
        let height = self.config.height;
        let target = self.locate(store, fonts, index);

        let shown = self
            .view
            .visible()
            .find(|d| d.index == target.index && d.display_line_no == target.display_line_no && d.height > 0)
            .map(|d| (d.y, d.height));
        if let Some((y, h)) = shown {
            if y < 0 {
                self.move_top(store, fonts, target, 0);
            } else if y + h > height {
                let overhang = (y + h - height).min(y);
                self.scroll_pixels(store, fonts, overhang);
            }
            return;
        }

        let target_height = self
            .display_lines_of(store, fonts, target.index.line)
            .into_iter()
            .find(|(s, _)| s.display_line_no == target.display_line_no)
            .map_or(0, |(_, h)| h);
        let near = height / 3;
        let top = self.top_start(store, fonts);
        if target.index < top.index {
            let (reach, _) = self.measure_down(store, fonts, target, near);
            if reach.index >= top.index {
                self.move_top(store, fonts, target, 0);
                return;
            }
        } else {
            let bottom = self
                .view
                .visible()
                .filter(|d| d.height > 0)
                .last()
                .map(|d| (d.index, d.y));
            if let Some((bottom, y)) = bottom {
                let bottom = self.locate(store, fonts, bottom);
                let (reach, _) = self.measure_down(store, fonts, bottom, height - y + near);
                if reach.index >= target.index {
                    let (start, offset) = self.measure_up(store, fonts, target, height - target_height);
                    self.move_top(store, fonts, start, offset);
                    return;
                }
            }
        }
        let (start, offset) = self.measure_up(store, fonts, target, (height - target_height) / 2);
        debug!(target: "textdisp::view", %index, "centering far index");
        self.move_top(store, fonts, start, offset);
    }

    /// Fractions of the widest visible line left of the view and at its
    /// right edge.
    pub fn xview(&self) -> (f64, f64) {
        let width = self.config.width.max(1);
        let total = self.view.max_length.max(self.view.x_offset + width);
        if total <= 0 {
            return (0.0, 1.0);
        }
        let total = f64::from(total);
        (
            f64::from(self.view.x_offset) / total,
            (f64::from(self.view.x_offset + width) / total).min(1.0),
        )
    }

    fn set_x_offset(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, offset: i32) {
        self.update_display_info(store, fonts);
        let max = (self.view.max_length - self.config.width).max(0);
        let offset = offset.clamp(0, max);
        if offset != self.view.x_offset {
            self.view.x_offset = offset;
            self.view.redraw_all = true;
            self.report_xview();
        }
    }

    /// Scrolls horizontally so `fraction` of the widest line is left of the
    /// view.
    pub fn xview_moveto(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, fraction: f64) {
        self.update_display_info(store, fonts);
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let offset = (fraction * f64::from(self.view.max_length)).round() as i32;
        self.set_x_offset(store, fonts, offset);
    }

    /// Scrolls horizontally by `count` units or pages.
    pub fn xview_scroll(&mut self, store: &mut dyn TextStore, fonts: &dyn FontMetrics, count: i32, unit: ScrollUnit) {
        let font = store.default_style().font;
        let char_width = fonts.average_char_width(font).max(1);
        let step = match unit {
            ScrollUnit::Units => char_width,
            ScrollUnit::Pages => (self.config.width - 2 * char_width).max(char_width),
        };
        let offset = self.view.x_offset.saturating_add(count.saturating_mul(step));
        self.set_x_offset(store, fonts, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;
    use crate::host::HostEvent;
    use crate::model::buffer::TextBuffer;
    use crate::model::font::CellMetrics;
    use crate::model::style::{Style, WrapMode};

    fn numbered(lines: usize) -> String {
        (0..lines).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    fn setup(text: &str, style: Style) -> (TextBuffer, CellMetrics, DisplayState) {
        let buffer = TextBuffer::from_text(text, style.shared(), 20);
        let fonts = CellMetrics::new(10, 20);
        let mut state = DisplayState::new(DisplayConfig::new(100, 100), buffer.line_count());
        let mut buffer = buffer;
        state.update_display_info(&mut buffer, &fonts);
        (buffer, fonts, state)
    }

    fn top_line(state: &DisplayState) -> usize {
        state.viewport().top().line
    }

    #[test]
    fn scroll_lines_moves_by_display_lines() {
        let (mut buffer, fonts, mut state) = setup(&numbered(50), Style::default());
        state.scroll_lines(&mut buffer, &fonts, 3);
        assert_eq!(top_line(&state), 3);
        state.scroll_lines(&mut buffer, &fonts, -2);
        assert_eq!(top_line(&state), 1);
        state.scroll_lines(&mut buffer, &fonts, -10);
        assert_eq!(top_line(&state), 0);
    }

    #[test]
    fn scroll_lines_counts_wrapped_lines() {
        let text = format!("aaaa bbbb cccc\n{}", numbered(20));
        let (mut buffer, fonts, mut state) = setup(&text, Style::default());
        state.config.width = 60;
        state.invalidate_all(&mut buffer);
        state.update_display_info(&mut buffer, &fonts);
        state.scroll_lines(&mut buffer, &fonts, 2);
        assert_eq!(state.viewport().top(), TextIndex::new(0, 10));
        state.scroll_lines(&mut buffer, &fonts, 1);
        assert_eq!(state.viewport().top(), TextIndex::line_start(1));
    }

    #[test]
    fn scroll_pixels_keeps_sub_line_offset() {
        let (mut buffer, fonts, mut state) = setup(&numbered(50), Style::default());
        state.scroll_pixels(&mut buffer, &fonts, 45);
        assert_eq!((top_line(&state), state.viewport().top_offset()), (2, 5));
        state.scroll_pixels(&mut buffer, &fonts, -3);
        assert_eq!((top_line(&state), state.viewport().top_offset()), (2, 2));
        state.scroll_pixels(&mut buffer, &fonts, -12);
        assert_eq!((top_line(&state), state.viewport().top_offset()), (1, 10));
    }

    #[test]
    fn scroll_pages_overlaps_two_lines() {
        let (mut buffer, fonts, mut state) = setup(&numbered(50), Style::default());
        state.scroll_pages(&mut buffer, &fonts, 1);
        assert_eq!(top_line(&state), 3);
        state.scroll_pages(&mut buffer, &fonts, -1);
        assert_eq!(top_line(&state), 0);
    }

    #[test]
    fn scrolling_past_end_keeps_view_full() {
        let (mut buffer, fonts, mut state) = setup(&numbered(10), Style::default());
        state.scroll_lines(&mut buffer, &fonts, 100);
        assert_eq!(top_line(&state), 5);
        let bottom = state.viewport().visible().last().map(|d| d.y + d.height);
        assert_eq!(bottom, Some(100));
    }

    #[test]
    fn yview_reports_fractions() {
        let (mut buffer, fonts, mut state) = setup(&numbered(10), Style::default());
        assert_eq!(state.yview(&mut buffer, &fonts), (0.0, 0.5));
        state.scroll_lines(&mut buffer, &fonts, 5);
        assert_eq!(state.yview(&mut buffer, &fonts), (0.5, 1.0));
        let events = state.take_events();
        assert!(events.contains(&HostEvent::YView { first: 0.5, last: 1.0 }));
    }

    #[test]
    fn yview_moveto_jumps_to_fraction() {
        let (mut buffer, fonts, mut state) = setup(&numbered(100), Style::default());
        state.yview_moveto(&mut buffer, &fonts, 0.5);
        assert_eq!(top_line(&state), 50);
        state.yview_moveto(&mut buffer, &fonts, 1.0);
        assert_eq!(top_line(&state), 95);
        state.yview_moveto(&mut buffer, &fonts, f64::NAN);
        assert_eq!(top_line(&state), 0);
    }

    #[test]
    fn see_scrolls_minimally_when_near() {
        let (mut buffer, fonts, mut state) = setup(&numbered(100), Style::default());
        state.see(&mut buffer, &fonts, TextIndex::new(6, 0));
        assert_eq!(top_line(&state), 2);
        let last = state.viewport().visible().last().map(|d| (d.index.line, d.y + d.height));
        assert_eq!(last, Some((6, 100)));

        state.see(&mut buffer, &fonts, TextIndex::new(1, 0));
        assert_eq!((top_line(&state), state.viewport().top_offset()), (1, 0));
    }

    #[test]
    fn see_centres_distant_index() {
        let (mut buffer, fonts, mut state) = setup(&numbered(100), Style::default());
        state.see(&mut buffer, &fonts, TextIndex::new(50, 0));
        assert_eq!(top_line(&state), 48);
        assert_eq!(state.viewport().top_offset(), 0);
    }

    #[test]
    fn see_leaves_visible_index_alone() {
        let (mut buffer, fonts, mut state) = setup(&numbered(100), Style::default());
        state.see(&mut buffer, &fonts, TextIndex::new(3, 2));
        assert_eq!(top_line(&state), 0);
    }

    #[test]
    fn xview_scrolls_long_lines() {
        let style = Style {
            wrap: WrapMode::None,
            ..Style::default()
        };
        let (mut buffer, fonts, mut state) = setup(&"x".repeat(40), style);
        assert_eq!(state.xview(), (0.0, 0.25));
        state.xview_scroll(&mut buffer, &fonts, 3, ScrollUnit::Units);
        assert_eq!(state.viewport().x_offset(), 30);
        state.xview_moveto(&mut buffer, &fonts, 1.0);
        assert_eq!(state.viewport().x_offset(), 300);
        assert_eq!(state.xview(), (0.75, 1.0));
        state.xview_scroll(&mut buffer, &fonts, -1, ScrollUnit::Pages);
        assert_eq!(state.viewport().x_offset(), 220);
    }
}
