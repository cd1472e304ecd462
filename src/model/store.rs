//! Text storage interface consumed by the display engine.
//!
//! The engine reads logical lines through [`TextStore`] and writes per-line
//! metrics back into the [`PixelInfo`] slot each line carries. The store keeps
//! a cumulative pixel index over those heights so the viewport can map pixel
//! offsets to lines in O(log n). Changing a line's height is O(log n) too;
//! the cost of adding or removing lines is up to the store.

use crate::layout::breaks::{compute_break_opportunities, BreakClass};
use crate::metrics::cache::PixelInfo;
use crate::model::segment::{Segment, SegmentKind};
use crate::model::style::StyleRef;
use std::cell::OnceCell;

/// Placeholder byte standing in for one-byte objects in [`LogicalLine::flat_text`].
pub const OBJECT_PLACEHOLDER: char = ' ';
/// Placeholder byte standing in for soft hyphens in [`LogicalLine::flat_text`].
pub const HYPHEN_PLACEHOLDER: char = '\u{1}';

/// A paragraph: the segments between two newlines plus its metric slot.
#[derive(Debug, Clone)]
pub struct LogicalLine {
    segments: Vec<Segment>,
    pixel_info: PixelInfo,
    flat: OnceCell<Box<str>>,
    breaks: OnceCell<Box<[BreakClass]>>,
}

impl LogicalLine {
    /// Creates a line with an estimated height and stale metrics.
    pub fn new(segments: Vec<Segment>, estimated_height: usize) -> Self {
        Self {
            segments,
            pixel_info: PixelInfo::estimated(estimated_height),
            flat: OnceCell::new(),
            breaks: OnceCell::new(),
        }
    }

    /// Segments in order. The terminating newline is implicit.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Replaces the segments, dropping derived caches and marking the
    /// metrics stale.
    pub fn set_segments(&mut self, segments: Vec<Segment>) {
        self.segments = segments;
        self.flat = OnceCell::new();
        self.breaks = OnceCell::new();
        self.pixel_info.invalidate();
    }

    /// Takes the segments out, leaving the line empty.
    pub fn take_segments(&mut self) -> Vec<Segment> {
        let segments = std::mem::take(&mut self.segments);
        self.set_segments(Vec::new());
        segments
    }

    /// Byte length including the terminating newline.
    pub fn byte_len(&self) -> usize {
        self.content_len() + 1
    }

    /// Byte length excluding the terminating newline.
    pub fn content_len(&self) -> usize {
        self.segments.iter().map(Segment::byte_len).sum()
    }

    /// Cached metrics.
    pub fn pixel_info(&self) -> &PixelInfo {
        &self.pixel_info
    }

    /// Cached metrics, mutably.
    pub fn pixel_info_mut(&mut self) -> &mut PixelInfo {
        &mut self.pixel_info
    }

    /// Style in effect at the start of the line.
    pub fn first_style(&self) -> Option<&StyleRef> {
        self.segments.first().map(|s| &s.style)
    }

    /// Style of the segment covering `byte`, falling back to the last
    /// segment's style at the end of the line.
    pub fn style_at(&self, byte: usize) -> Option<&StyleRef> {
        let mut offset = 0;
        for seg in &self.segments {
            let len = seg.byte_len();
            if len > 0 && byte < offset + len {
                return Some(&seg.style);
            }
            offset += len;
        }
        self.segments.last().map(|s| &s.style)
    }

    /// The line as a string with the same byte layout as the index space:
    /// objects and hyphens are replaced by one-byte placeholders, marks
    /// vanish, and a trailing newline is appended.
    pub fn flat_text(&self) -> &str {
        self.flat.get_or_init(|| {
            let mut text = String::with_capacity(self.byte_len());
            for seg in &self.segments {
                match &seg.kind {
                    SegmentKind::Text(t) => text.push_str(t),
                    SegmentKind::Hyphen => text.push(HYPHEN_PLACEHOLDER),
                    SegmentKind::Image { .. } | SegmentKind::Window { .. } => {
                        text.push(OBJECT_PLACEHOLDER)
                    }
                    SegmentKind::Mark { .. } => {}
                }
            }
            text.push('\n');
            text.into_boxed_str()
        })
    }

    /// Line-break opportunities indexed by byte offset, computed once per
    /// text change.
    pub fn break_opportunities(&self) -> &[BreakClass] {
        self.breaks.get_or_init(|| {
            let lang = self.first_style().and_then(|s| s.lang.as_deref());
            compute_break_opportunities(self.flat_text(), lang)
        })
    }
}

/// Logical-line storage with per-line metric slots and a cumulative pixel
/// index.
pub trait TextStore {
    /// Number of logical lines; never zero.
    fn line_count(&self) -> usize;

    /// Line `n`, if it exists.
    fn line(&self, n: usize) -> Option<&LogicalLine>;

    /// Metric slot of line `n`.
    fn pixel_info(&self, n: usize) -> Option<&PixelInfo> {
        self.line(n).map(LogicalLine::pixel_info)
    }

    /// Mutable metric slot of line `n`.
    fn pixel_info_mut(&mut self, n: usize) -> Option<&mut PixelInfo>;

    /// Records the finished height and display-line count of line `n` and
    /// updates the cumulative index.
    fn set_line_metric(&mut self, n: usize, height: usize, display_lines: usize);

    /// Pixel offset of the top of line `n`; `pixel_offset_of_line(line_count())`
    /// is the document height.
    fn pixel_offset_of_line(&self, n: usize) -> usize;

    /// The line covering document pixel `y` and the offset of its top.
    /// Offsets past the end map to the last line.
    fn line_at_pixel(&self, y: usize) -> (usize, usize);

    /// Document height in pixels according to the cached metrics.
    fn total_pixels(&self) -> usize;

    /// Style used for lines with no segments.
    fn default_style(&self) -> &StyleRef;
}
