//! A text view bundling a document, its fonts and its display state.
//!
//! [`TextWidget`] is what an embedding toolkit talks to. Every edit goes
//! through it so the display state hears about the lines that changed, and
//! every query passes the document and fonts along to
//! [`DisplayState`].

use crate::config::{DisplayConfig, ResolvedConfig};
use crate::display::DisplayState;
use crate::host::{Canvas, Rect, ViewHost};
use crate::layout::chunk::ChunkKind;
use crate::layout::dline::DLine;
use crate::model::buffer::{EditSummary, TextBuffer};
use crate::model::error::StoreError;
use crate::model::font::FontMetrics;
use crate::model::index::TextIndex;
use crate::model::segment::{Gravity, Segment, INSERT_MARK};
use crate::model::store::TextStore;
use crate::model::style::Style;
use crate::scheduler::{MetricTask, TaskStatus};
use crate::view_state::{LineBox, ScrollUnit};
use tracing::debug;

/// One visible display line, as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleLine {
    /// Start of the display line.
    pub index: TextIndex,
    /// Top edge in view coordinates.
    pub y: i32,
    /// Height in pixels.
    pub height: i32,
    /// Text as it is drawn, without the newline.
    pub text: String,
}

/// A document shown in a text view.
pub struct TextWidget {
    buffer: TextBuffer,
    fonts: Box<dyn FontMetrics>,
    state: DisplayState,
    task: MetricTask,
}

impl std::fmt::Debug for TextWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextWidget")
            .field("lines", &self.buffer.line_count())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TextWidget {
    /// View of `buffer` with the given fonts and geometry.
    pub fn new(buffer: TextBuffer, fonts: Box<dyn FontMetrics>, config: DisplayConfig) -> Self {
        let task = MetricTask::new(config.metric_budget);
        let state = DisplayState::new(config, buffer.line_count());
        Self {
            buffer,
            fonts,
            state,
            task,
        }
    }

    /// View of `text` set up from a resolved configuration.
    pub fn from_config(text: &str, config: &ResolvedConfig) -> Self {
        let fonts = config.font_metrics();
        let estimate = fonts.line_height(0).max(1) as usize;
        let buffer = TextBuffer::from_text(text, config.default_style(), estimate);
        Self::new(buffer, Box::new(fonts), config.display_config())
    }

    /// The document.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// The display state.
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// The font backend.
    pub fn fonts(&self) -> &dyn FontMetrics {
        &*self.fonts
    }

    fn edited(&mut self, summary: EditSummary) -> EditSummary {
        if summary.lines_added > 0 {
            self.state
                .lines_inserted(&mut self.buffer, summary.first_line, summary.lines_added);
        } else if summary.lines_removed > 0 {
            self.state
                .lines_deleted(&mut self.buffer, summary.first_line, summary.lines_removed);
        } else {
            self.state
                .invalidate_lines(&mut self.buffer, summary.first_line, summary.last_line);
        }
        self.state.request_redraw();
        summary
    }

    /// Inserts `text` at `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if `at` is not a valid position.
    pub fn insert(&mut self, at: TextIndex, text: &str) -> Result<EditSummary, StoreError> {
        let summary = self.buffer.insert_text(at, text)?;
        debug!(target: "textdisp::view", %at, bytes = text.len(), lines = summary.lines_added, "insert");
        Ok(self.edited(summary))
    }

    /// Inserts an image, window or hyphen segment at `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if `at` is not a valid position.
    pub fn insert_segment(&mut self, at: TextIndex, segment: Segment) -> Result<EditSummary, StoreError> {
        let summary = self.buffer.insert_segment(at, segment)?;
        Ok(self.edited(summary))
    }

    /// Deletes `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid positions or a reversed range.
    pub fn delete(&mut self, from: TextIndex, to: TextIndex) -> Result<EditSummary, StoreError> {
        let summary = self.buffer.delete(from, to)?;
        debug!(target: "textdisp::view", %from, %to, lines = summary.lines_removed, "delete");
        Ok(self.edited(summary))
    }

    /// Restyles `[from, to)` with `f`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid positions or a reversed range.
    pub fn restyle(
        &mut self,
        from: TextIndex,
        to: TextIndex,
        f: impl FnMut(&Style) -> Style,
    ) -> Result<EditSummary, StoreError> {
        let summary = self.buffer.restyle(from, to, f)?;
        Ok(self.edited(summary))
    }

    /// Hides or reveals `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid positions or a reversed range.
    pub fn set_elided(&mut self, from: TextIndex, to: TextIndex, elide: bool) -> Result<EditSummary, StoreError> {
        let summary = self.buffer.set_elided(from, to, elide)?;
        self.state
            .elision_changed(&mut self.buffer, summary.first_line, summary.last_line);
        self.state.request_redraw();
        Ok(summary)
    }

    /// Moves the insertion cursor to `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if `at` is not a valid position.
    pub fn set_insert(&mut self, at: TextIndex) -> Result<EditSummary, StoreError> {
        let summary = self.buffer.set_mark(INSERT_MARK, at, Gravity::Right)?;
        Ok(self.edited(summary))
    }

    /// Replaces the view geometry and scheduling settings.
    pub fn configure(&mut self, config: DisplayConfig) {
        if config.metric_budget != self.state.config().metric_budget {
            self.task = MetricTask::new(config.metric_budget);
        }
        self.state.set_config(&mut self.buffer, config);
        self.state.request_redraw();
    }

    /// Changes the view size.
    pub fn resize(&mut self, width: i32, height: i32) {
        let config = DisplayConfig {
            width,
            height,
            ..self.state.config().clone()
        };
        self.configure(config);
    }

    /// Vertical view fractions.
    pub fn yview(&mut self) -> (f64, f64) {
        self.state.yview(&mut self.buffer, &*self.fonts)
    }

    /// Scrolls so that `fraction` of the document lies above the view.
    pub fn yview_moveto(&mut self, fraction: f64) {
        self.state.yview_moveto(&mut self.buffer, &*self.fonts, fraction);
    }

    /// Puts the display line holding `index` at the top.
    pub fn set_yview(&mut self, index: TextIndex, offset: i32) {
        self.state.set_yview(&mut self.buffer, &*self.fonts, index, offset);
    }

    /// Scrolls by display lines.
    pub fn scroll_lines(&mut self, count: i32) {
        self.state.scroll_lines(&mut self.buffer, &*self.fonts, count);
    }

    /// Scrolls by pixels.
    pub fn scroll_pixels(&mut self, pixels: i32) {
        self.state.scroll_pixels(&mut self.buffer, &*self.fonts, pixels);
    }

    /// Scrolls by pages.
    pub fn scroll_pages(&mut self, count: i32) {
        self.state.scroll_pages(&mut self.buffer, &*self.fonts, count);
    }

    /// Horizontal view fractions.
    pub fn xview(&self) -> (f64, f64) {
        self.state.xview()
    }

    /// Scrolls horizontally to `fraction` of the longest visible line.
    pub fn xview_moveto(&mut self, fraction: f64) {
        self.state.xview_moveto(&mut self.buffer, &*self.fonts, fraction);
    }

    /// Scrolls horizontally by `count` units or pages.
    pub fn xview_scroll(&mut self, count: i32, unit: ScrollUnit) {
        self.state.xview_scroll(&mut self.buffer, &*self.fonts, count, unit);
    }

    /// Scrolls `index` into view.
    pub fn see(&mut self, index: TextIndex) {
        self.state.see(&mut self.buffer, &*self.fonts, index);
    }

    /// Box of the character at `index`, if visible.
    pub fn bbox(&mut self, index: TextIndex) -> Option<Rect> {
        self.state.bbox(&mut self.buffer, &*self.fonts, index)
    }

    /// Geometry of the display line holding `index`, if visible.
    pub fn dline_info(&mut self, index: TextIndex) -> Option<LineBox> {
        self.state.dline_info(&mut self.buffer, &*self.fonts, index)
    }

    /// Index nearest to view point `(x, y)`.
    pub fn index_at(&mut self, x: i32, y: i32) -> TextIndex {
        self.state.index_at(&mut self.buffer, &*self.fonts, x, y)
    }

    /// Display lines between two indices.
    pub fn count_display_lines(&mut self, from: TextIndex, to: TextIndex) -> isize {
        self.state.count_display_lines(&mut self.buffer, &*self.fonts, from, to)
    }

    /// Pixels between the display lines holding two indices.
    pub fn count_ypixels(&mut self, from: TextIndex, to: TextIndex) -> isize {
        self.state.count_ypixels(&mut self.buffer, &*self.fonts, from, to)
    }

    /// Rebuilds the visible list if needed.
    pub fn update(&mut self) {
        self.state.update_display_info(&mut self.buffer, &*self.fonts);
    }

    /// Runs one metric step. A deferred step performs the pending
    /// redisplay layout so the next step can run.
    pub fn step_metrics(&mut self) -> TaskStatus {
        let status = self.task.step(&mut self.state, &mut self.buffer, &*self.fonts);
        if status == TaskStatus::Deferred {
            self.update();
        }
        status
    }

    /// Steps the metric task until every line's metrics are current.
    /// Returns the number of steps taken.
    pub fn finish_metrics(&mut self) -> usize {
        let mut steps = 0;
        while self.step_metrics() != TaskStatus::Finished {
            steps += 1;
        }
        steps + 1
    }

    /// Draws what changed since the last call.
    pub fn display(&mut self, canvas: &mut dyn Canvas) {
        self.state.display(&mut self.buffer, &*self.fonts, canvas);
    }

    /// Hands queued notifications to `host`.
    pub fn deliver(&mut self, host: &mut dyn ViewHost) {
        self.state.deliver(host);
    }

    /// The visible display lines as text.
    pub fn visible_lines(&mut self) -> Vec<VisibleLine> {
        self.update();
        self.state
            .viewport()
            .visible()
            .filter(|d| d.height > 0)
            .map(|d| VisibleLine {
                index: d.index,
                y: d.y,
                height: d.height,
                text: shown_text(d),
            })
            .collect()
    }
}

fn shown_text(dline: &DLine) -> String {
    let mut text = String::new();
    for chunk in &dline.chunks {
        match &chunk.kind {
            ChunkKind::Char(run) => text.push_str(run.shown()),
            ChunkKind::Hyphen { shown: Some(hyphen) } => text.push_str(hyphen),
            ChunkKind::Tab => text.push('\t'),
            _ => {}
        }
    }
    text
}
