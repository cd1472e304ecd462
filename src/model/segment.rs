//! Typed pieces of a logical line.

use crate::model::style::StyleRef;
use std::rc::Rc;

/// Name of the mark displayed as the insertion cursor.
pub const INSERT_MARK: &str = "insert";

/// Which side a mark sticks to when text is inserted at its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gravity {
    /// Stays before inserted text.
    Left,
    /// Moves after inserted text.
    #[default]
    Right,
}

/// Payload of a segment.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    /// Characters without newlines. Shared so chunks can borrow runs cheaply.
    Text(Rc<str>),
    /// Soft hyphen; invisible unless the line breaks at it.
    Hyphen,
    /// Embedded image.
    Image {
        /// Image name.
        name: Rc<str>,
        /// Pixel width.
        width: i32,
        /// Pixel height.
        height: i32,
        /// Pixels above the baseline.
        ascent: i32,
    },
    /// Embedded child window.
    Window {
        /// Window name.
        name: Rc<str>,
        /// Requested pixel width.
        width: i32,
        /// Requested pixel height.
        height: i32,
    },
    /// Zero-width named position.
    Mark {
        /// Mark name.
        name: Rc<str>,
        /// Insertion behavior.
        gravity: Gravity,
    },
}

/// A run of content with a single style.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// What the segment holds.
    pub kind: SegmentKind,
    /// Style applied to it.
    pub style: StyleRef,
}

impl Segment {
    /// Text segment. `text` must not contain a newline.
    pub fn text(text: &str, style: StyleRef) -> Self {
        debug_assert!(!text.contains('\n'));
        Self {
            kind: SegmentKind::Text(Rc::from(text)),
            style,
        }
    }

    /// Soft hyphen segment.
    pub fn hyphen(style: StyleRef) -> Self {
        Self {
            kind: SegmentKind::Hyphen,
            style,
        }
    }

    /// Embedded image segment.
    pub fn image(name: &str, width: i32, height: i32, ascent: i32, style: StyleRef) -> Self {
        Self {
            kind: SegmentKind::Image {
                name: Rc::from(name),
                width,
                height,
                ascent,
            },
            style,
        }
    }

    /// Embedded window segment.
    pub fn window(name: &str, width: i32, height: i32, style: StyleRef) -> Self {
        Self {
            kind: SegmentKind::Window {
                name: Rc::from(name),
                width,
                height,
            },
            style,
        }
    }

    /// Mark segment.
    pub fn mark(name: &str, gravity: Gravity, style: StyleRef) -> Self {
        Self {
            kind: SegmentKind::Mark {
                name: Rc::from(name),
                gravity,
            },
            style,
        }
    }

    /// Number of index bytes the segment occupies.
    pub fn byte_len(&self) -> usize {
        match &self.kind {
            SegmentKind::Text(text) => text.len(),
            SegmentKind::Hyphen | SegmentKind::Image { .. } | SegmentKind::Window { .. } => 1,
            SegmentKind::Mark { .. } => 0,
        }
    }

    /// Returns true for the insertion cursor mark.
    pub fn is_insert_mark(&self) -> bool {
        matches!(&self.kind, SegmentKind::Mark { name, .. } if &**name == INSERT_MARK)
    }

    /// Returns true for text segments.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, SegmentKind::Text(_))
    }
}
