//! In-memory [`TextStore`]: a vector of logical lines plus a [`HeightIndex`].
//!
//! Edits report what changed as an [`EditSummary`] so the caller can feed the
//! display engine's invalidation entry points; the buffer itself only resets
//! the metric stamps of the lines it rewrites.

use crate::metrics::cache::PixelInfo;
use crate::metrics::height_index::HeightIndex;
use crate::model::error::StoreError;
use crate::model::index::TextIndex;
use crate::model::segment::{Gravity, Segment, SegmentKind};
use crate::model::store::{LogicalLine, TextStore};
use crate::model::style::{Style, StyleRef};
use std::rc::Rc;

/// Lines affected by an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditSummary {
    /// First line whose content changed.
    pub first_line: usize,
    /// Last line (after the edit) whose content changed.
    pub last_line: usize,
    /// Number of lines inserted after `first_line`.
    pub lines_added: usize,
    /// Number of lines removed after `first_line`.
    pub lines_removed: usize,
}

/// In-memory document.
///
/// Line heights live in a [`HeightIndex`].
/// Height updates and pixel lookups are O(log n), but an edit that adds or
/// removes lines rebuilds the index in O(n log n).
///
/// # Examples
///
/// ```
/// # use textdisp::model::buffer::TextBuffer;
/// # use textdisp::model::index::TextIndex;
/// # use textdisp::model::store::TextStore;
/// let mut buffer = TextBuffer::from_text("hello\nworld", Default::default(), 16);
/// assert_eq!(buffer.line_count(), 2);
/// buffer.insert_text(TextIndex::new(0, 5), ",\nbig").unwrap();
/// assert_eq!(buffer.text(), "hello,\nbig\nworld");
/// ```
#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<LogicalLine>,
    heights: HeightIndex,
    default_style: StyleRef,
    estimated_line_height: usize,
}

impl TextBuffer {
    /// Empty document with a single empty line.
    pub fn new(default_style: StyleRef, estimated_line_height: usize) -> Self {
        Self::from_text("", default_style, estimated_line_height)
    }

    /// Document holding `text`, split into logical lines at `\n`.
    pub fn from_text(text: &str, default_style: StyleRef, estimated_line_height: usize) -> Self {
        let lines: Vec<LogicalLine> = text
            .split('\n')
            .map(|line| LogicalLine::new(text_segments(line, &default_style), estimated_line_height))
            .collect();
        let heights = HeightIndex::from_heights(vec![estimated_line_height; lines.len()]);
        Self {
            lines,
            heights,
            default_style,
            estimated_line_height,
        }
    }

    /// Height assumed for lines whose metrics were never computed.
    pub fn estimated_line_height(&self) -> usize {
        self.estimated_line_height
    }

    /// Text of the whole document; objects and marks are omitted.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, _) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&self.line_text(i));
        }
        out
    }

    /// Text of line `n` without the newline; objects and marks are omitted.
    pub fn line_text(&self, n: usize) -> String {
        let Some(line) = self.lines.get(n) else {
            return String::new();
        };
        line.segments()
            .iter()
            .filter_map(|s| match &s.kind {
                SegmentKind::Text(t) => Some(&**t),
                _ => None,
            })
            .collect()
    }

    /// Index just before the final newline.
    pub fn end_index(&self) -> TextIndex {
        let last = self.lines.len() - 1;
        TextIndex::new(last, self.lines[last].content_len())
    }

    fn check_index(&self, at: TextIndex) -> Result<(), StoreError> {
        let line = self.lines.get(at.line).ok_or(StoreError::LineOutOfRange {
            line: at.line,
            count: self.lines.len(),
        })?;
        let len = line.content_len();
        if at.byte > len {
            return Err(StoreError::ByteOutOfRange {
                line: at.line,
                byte: at.byte,
                len,
            });
        }
        if !line.flat_text().is_char_boundary(at.byte) {
            return Err(StoreError::NotCharBoundary { index: at });
        }
        Ok(())
    }

    fn check_range(&self, from: TextIndex, to: TextIndex) -> Result<(), StoreError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if to < from {
            return Err(StoreError::InvalidRange { from, to });
        }
        Ok(())
    }

    /// Style new text at `at` inherits: that of the preceding byte, else the
    /// following one, else the default.
    fn style_for_insert(&self, at: TextIndex) -> StyleRef {
        let line = &self.lines[at.line];
        let style = if at.byte > 0 {
            line.style_at(at.byte - 1)
        } else {
            line.first_style()
        };
        style.cloned().unwrap_or_else(|| self.default_style.clone())
    }

    fn new_line(&self, segments: Vec<Segment>) -> LogicalLine {
        LogicalLine::new(segments, self.estimated_line_height)
    }

    /// Inserts `text`, which may contain newlines, at `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if `at` does not name a character boundary in the
    /// document.
    pub fn insert_text(&mut self, at: TextIndex, text: &str) -> Result<EditSummary, StoreError> {
        self.check_index(at)?;
        let style = self.style_for_insert(at);

        let mut head = self.lines[at.line].take_segments();
        let split = split_at(&mut head, at.byte);
        let idx = skip_left_marks(&head, split);
        let tail = head.split_off(idx);

        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            head.extend(text_segments(first, &style));
        }
        let rest: Vec<&str> = pieces.collect();
        if rest.is_empty() {
            head.extend(tail);
            self.lines[at.line].set_segments(normalize(head));
            return Ok(EditSummary {
                first_line: at.line,
                last_line: at.line,
                ..EditSummary::default()
            });
        }

        self.lines[at.line].set_segments(normalize(head));
        let mut new_lines: Vec<LogicalLine> = Vec::with_capacity(rest.len());
        let last = rest.len() - 1;
        let mut tail = Some(tail);
        for (i, piece) in rest.into_iter().enumerate() {
            let mut segments = text_segments(piece, &style);
            if i == last {
                segments.extend(tail.take().unwrap_or_default());
            }
            new_lines.push(self.new_line(normalize(segments)));
        }

        let added = new_lines.len();
        self.lines.splice(at.line + 1..at.line + 1, new_lines);
        self.heights
            .splice(at.line + 1, 0, &vec![self.estimated_line_height; added]);
        Ok(EditSummary {
            first_line: at.line,
            last_line: at.line + added,
            lines_added: added,
            lines_removed: 0,
        })
    }

    /// Inserts a non-text segment at `at`. Text segments go through
    /// [`TextBuffer::insert_text`].
    ///
    /// # Errors
    ///
    /// Returns an error if `at` does not name a character boundary.
    pub fn insert_segment(&mut self, at: TextIndex, segment: Segment) -> Result<EditSummary, StoreError> {
        if let SegmentKind::Text(text) = &segment.kind {
            let text = text.clone();
            return self.insert_text(at, &text);
        }
        self.check_index(at)?;
        let mut segments = self.lines[at.line].take_segments();
        let split = split_at(&mut segments, at.byte);
        let idx = skip_left_marks(&segments, split);
        segments.insert(idx, segment);
        self.lines[at.line].set_segments(normalize(segments));
        Ok(EditSummary {
            first_line: at.line,
            last_line: at.line,
            ..EditSummary::default()
        })
    }

    /// Deletes `[from, to)`. Deleting across a line end joins the lines.
    /// Marks inside the range move to `from`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid indices or a reversed range.
    pub fn delete(&mut self, from: TextIndex, to: TextIndex) -> Result<EditSummary, StoreError> {
        let to = self.clamp_end(to);
        self.check_range(from, to)?;
        if from == to {
            return Ok(EditSummary {
                first_line: from.line,
                last_line: from.line,
                ..EditSummary::default()
            });
        }

        let mut head = self.lines[from.line].take_segments();
        let idx = split_at(&mut head, from.byte);
        let mut middle = head.split_off(idx);
        let tail = if from.line == to.line {
            let cut = split_at(&mut middle, to.byte - from.byte);
            middle.split_off(cut)
        } else {
            for line in &mut self.lines[from.line + 1..to.line] {
                middle.extend(line.take_segments());
            }
            let mut last = self.lines[to.line].take_segments();
            let cut = split_at(&mut last, to.byte);
            let tail = last.split_off(cut);
            middle.extend(last);
            tail
        };

        head.extend(middle.into_iter().filter(|s| matches!(s.kind, SegmentKind::Mark { .. })));
        head.extend(tail);
        self.lines[from.line].set_segments(normalize(head));

        let removed = to.line - from.line;
        if removed > 0 {
            self.lines.drain(from.line + 1..=to.line);
            self.heights.splice(from.line + 1, removed, &[]);
        }
        Ok(EditSummary {
            first_line: from.line,
            last_line: from.line,
            lines_added: 0,
            lines_removed: removed,
        })
    }

    /// Maps an end index one past a line's content to the start of the next
    /// line, so `(n, content_len + 1)` deletes the newline.
    fn clamp_end(&self, to: TextIndex) -> TextIndex {
        match self.lines.get(to.line) {
            Some(line) if to.byte == line.byte_len() && to.line + 1 < self.lines.len() => {
                TextIndex::line_start(to.line + 1)
            }
            Some(line) if to.byte >= line.byte_len() => TextIndex::new(to.line, line.content_len()),
            _ => to,
        }
    }

    /// Rewrites the style of every segment in `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid indices or a reversed range.
    pub fn restyle(
        &mut self,
        from: TextIndex,
        to: TextIndex,
        mut f: impl FnMut(&Style) -> Style,
    ) -> Result<EditSummary, StoreError> {
        let to = self.clamp_end(to);
        self.check_range(from, to)?;

        for n in from.line..=to.line {
            let mut segments = self.lines[n].take_segments();
            let start = if n == from.line {
                split_at(&mut segments, from.byte)
            } else {
                0
            };
            let end = if n == to.line {
                let end_byte = to.byte;
                split_at(&mut segments, end_byte)
            } else {
                segments.len()
            };
            for seg in &mut segments[start..end] {
                seg.style = Rc::new(f(&seg.style));
            }
            self.lines[n].set_segments(normalize(segments));
        }

        Ok(EditSummary {
            first_line: from.line,
            last_line: to.line,
            ..EditSummary::default()
        })
    }

    /// Hides or reveals `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid indices or a reversed range.
    pub fn set_elided(&mut self, from: TextIndex, to: TextIndex, elide: bool) -> Result<EditSummary, StoreError> {
        self.restyle(from, to, |style| Style {
            elide,
            ..style.clone()
        })
    }

    /// Position of the mark `name`.
    pub fn mark_index(&self, name: &str) -> Option<TextIndex> {
        self.lines.iter().enumerate().find_map(|(n, line)| {
            let mut offset = 0;
            for seg in line.segments() {
                if matches!(&seg.kind, SegmentKind::Mark { name: m, .. } if &**m == name) {
                    return Some(TextIndex::new(n, offset));
                }
                offset += seg.byte_len();
            }
            None
        })
    }

    /// Moves (or creates) the mark `name` to `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if `at` is not a character boundary.
    pub fn set_mark(&mut self, name: &str, at: TextIndex, gravity: Gravity) -> Result<EditSummary, StoreError> {
        self.check_index(at)?;
        let old = self.mark_index(name);
        if let Some(old) = old {
            let mut segments = self.lines[old.line].take_segments();
            segments.retain(|s| !matches!(&s.kind, SegmentKind::Mark { name: m, .. } if &**m == name));
            self.lines[old.line].set_segments(segments);
        }
        let style = self.style_for_insert(at);
        let summary = self.insert_segment(at, Segment::mark(name, gravity, style))?;
        Ok(EditSummary {
            first_line: old.map_or(at.line, |o| o.line.min(at.line)),
            last_line: old.map_or(at.line, |o| o.line.max(at.line)),
            ..summary
        })
    }
}

impl TextStore for TextBuffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, n: usize) -> Option<&LogicalLine> {
        self.lines.get(n)
    }

    fn pixel_info_mut(&mut self, n: usize) -> Option<&mut PixelInfo> {
        self.lines.get_mut(n).map(LogicalLine::pixel_info_mut)
    }

    fn set_line_metric(&mut self, n: usize, height: usize, display_lines: usize) {
        if let Some(line) = self.lines.get_mut(n) {
            let info = line.pixel_info_mut();
            info.height = height;
            info.display_lines = display_lines;
            self.heights.set(n, height);
        }
    }

    fn pixel_offset_of_line(&self, n: usize) -> usize {
        self.heights.offset_of(n)
    }

    fn line_at_pixel(&self, y: usize) -> (usize, usize) {
        let line = self
            .heights
            .lower_bound(y)
            .unwrap_or(self.lines.len() - 1);
        (line, self.heights.offset_of(line))
    }

    fn total_pixels(&self) -> usize {
        self.heights.total()
    }

    fn default_style(&self) -> &StyleRef {
        &self.default_style
    }
}

fn text_segments(text: &str, style: &StyleRef) -> Vec<Segment> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Segment::text(text, style.clone())]
    }
}

/// Ensures a segment boundary at `byte` and returns the index of the first
/// segment starting there. The caller has validated `byte`.
fn split_at(segments: &mut Vec<Segment>, byte: usize) -> usize {
    let mut offset = 0;
    for i in 0..segments.len() {
        if offset == byte {
            return i;
        }
        let len = segments[i].byte_len();
        if byte < offset + len {
            let cut = byte - offset;
            let SegmentKind::Text(text) = &segments[i].kind else {
                return i;
            };
            let style = segments[i].style.clone();
            let (a, b) = text.split_at(cut);
            let (a, b) = (Segment::text(a, style.clone()), Segment::text(b, style));
            segments[i] = a;
            segments.insert(i + 1, b);
            return i + 1;
        }
        offset += len;
    }
    debug_assert_eq!(offset, byte, "split past end of line");
    segments.len()
}

/// Skips left-gravity marks sitting at the insertion point.
fn skip_left_marks(segments: &[Segment], mut idx: usize) -> usize {
    while let Some(Segment {
        kind: SegmentKind::Mark {
            gravity: Gravity::Left,
            ..
        },
        ..
    }) = segments.get(idx)
    {
        idx += 1;
    }
    idx
}

/// Drops empty text segments and joins neighbouring text with equal style.
fn normalize(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    for seg in segments {
        if let SegmentKind::Text(text) = &seg.kind {
            if text.is_empty() {
                continue;
            }
            if let Some(Segment {
                kind: SegmentKind::Text(prev),
                style,
            }) = out.last_mut()
            {
                if *style == seg.style {
                    let joined = format!("{prev}{text}");
                    *prev = Rc::from(joined.as_str());
                    continue;
                }
            }
        }
        out.push(seg);
    }
    out
}
