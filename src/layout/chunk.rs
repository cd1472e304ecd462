//! Chunks: the smallest visual units of a display line.
//!
//! Every chunk covers a contiguous byte span of the logical line (possibly
//! empty, for marks and inserted hyphenation text) and knows how to measure
//! a point, report a character's box, draw itself and undraw itself.

use crate::host::{Canvas, Rect};
use crate::model::font::FontMetrics;
use crate::model::style::StyleRef;
use std::rc::Rc;
use unicode_segmentation::UnicodeSegmentation;

/// A run of characters drawn from a shared text payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharRun {
    /// Shared payload; usually the whole text segment.
    pub text: Rc<str>,
    /// Start of the run in `text`.
    pub start: usize,
    /// End of the run in `text`.
    pub end: usize,
    /// Drawing stops here; bytes in `shown_end..end` are consumed but hidden.
    pub shown_end: usize,
    /// Extra pixels after each space, for full justification.
    pub spacing: Vec<i32>,
}

impl CharRun {
    /// Run over `text[start..end]`, fully shown.
    pub fn new(text: Rc<str>, start: usize, end: usize) -> Self {
        Self {
            text,
            start,
            end,
            shown_end: end,
            spacing: Vec::new(),
        }
    }

    /// Text that is drawn.
    pub fn shown(&self) -> &str {
        &self.text[self.start..self.shown_end]
    }
}

/// Chunk payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkKind {
    /// Characters.
    Char(CharRun),
    /// A tab; its width is set by tab alignment.
    Tab,
    /// A soft hyphen; drawn only when the line breaks at it.
    Hyphen {
        /// Text drawn in its place, if the line breaks here.
        shown: Option<Rc<str>>,
    },
    /// Embedded image.
    Image {
        /// Image name.
        name: Rc<str>,
    },
    /// Embedded window.
    Window {
        /// Window name.
        name: Rc<str>,
    },
    /// Hidden text.
    Elided,
    /// Insertion cursor.
    Cursor,
}

/// Position and width of one grapheme inside a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    /// Byte offset relative to the chunk start.
    pub offset: usize,
    /// Left edge in line coordinates.
    pub x: i32,
    /// Width including justification space.
    pub width: i32,
}

/// One laid-out chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Payload.
    pub kind: ChunkKind,
    /// Style shared with the segment.
    pub style: StyleRef,
    /// Left edge in line coordinates.
    pub x: i32,
    /// Width in pixels.
    pub width: i32,
    /// Byte offset of the chunk from the display line start.
    pub byte_offset: usize,
    /// Bytes of the logical line the chunk covers.
    pub byte_count: usize,
    /// Pixels above the baseline.
    pub ascent: i32,
    /// Pixels below the baseline.
    pub descent: i32,
    /// The line may break after this many bytes of the chunk.
    pub break_index: Option<usize>,
}

impl Chunk {
    /// Creates a chunk with no vertical extent and no break opportunity.
    pub fn new(kind: ChunkKind, style: StyleRef, x: i32, width: i32, byte_count: usize) -> Self {
        Self {
            kind,
            style,
            x,
            width,
            byte_offset: 0,
            byte_count,
            ascent: 0,
            descent: 0,
            break_index: None,
        }
    }

    /// Right edge in line coordinates.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Returns true if the chunk takes part in line height.
    pub fn has_extent(&self) -> bool {
        !matches!(self.kind, ChunkKind::Elided | ChunkKind::Cursor)
    }

    /// Returns true for character runs whose bytes map one to one onto the
    /// shown text.
    fn is_direct_run(&self) -> Option<&CharRun> {
        match &self.kind {
            ChunkKind::Char(run) if run.end - run.start == self.byte_count => Some(run),
            _ => None,
        }
    }

    /// Grapheme positions of a direct character run.
    pub fn glyphs(&self, fonts: &dyn FontMetrics) -> Vec<Glyph> {
        let Some(run) = self.is_direct_run() else {
            return vec![Glyph {
                offset: 0,
                x: self.x,
                width: self.width,
            }];
        };
        let mut out = Vec::new();
        let mut x = self.x;
        let mut spaces = run.spacing.iter();
        for (offset, g) in run.shown().grapheme_indices(true) {
            let mut width = fonts.text_width(self.style.font, g);
            if g == " " {
                width += spaces.next().copied().unwrap_or(0);
            }
            out.push(Glyph { offset, x, width });
            x += width;
        }
        let shown_len = run.shown_end - run.start;
        if shown_len < self.byte_count {
            out.push(Glyph {
                offset: shown_len,
                x,
                width: 0,
            });
        }
        out
    }

    /// Byte offset within the chunk of the character under `x`.
    pub fn measure(&self, fonts: &dyn FontMetrics, x: i32) -> usize {
        if self.byte_count == 0 {
            return 0;
        }
        let glyphs = self.glyphs(fonts);
        glyphs
            .iter()
            .find(|g| x < g.x + g.width)
            .or(glyphs.last())
            .map_or(0, |g| g.offset.min(self.byte_count - 1))
    }

    /// Box of the character at byte `offset` within the chunk, with `baseline`
    /// relative to the line top.
    pub fn bbox(&self, fonts: &dyn FontMetrics, offset: usize, baseline: i32) -> Rect {
        let glyphs = self.glyphs(fonts);
        let glyph = glyphs
            .iter()
            .rev()
            .find(|g| g.offset <= offset)
            .copied()
            .unwrap_or(Glyph {
                offset: 0,
                x: self.x,
                width: self.width,
            });
        Rect::new(
            glyph.x,
            baseline - self.ascent,
            glyph.width,
            self.ascent + self.descent,
        )
    }

    /// Draws the chunk. `x_offset` is the horizontal scroll, `top` the line's
    /// top edge and `baseline` its baseline, both in viewport coordinates.
    pub fn display(
        &self,
        canvas: &mut dyn Canvas,
        fonts: &dyn FontMetrics,
        x_offset: i32,
        top: i32,
        baseline: i32,
        line_height: i32,
        cursor_width: i32,
    ) {
        let x = self.x - x_offset;
        let text_baseline = baseline - self.style.offset;
        match &self.kind {
            ChunkKind::Char(run) if run.spacing.is_empty() => {
                if !run.shown().is_empty() {
                    canvas.draw_text(x, text_baseline, run.shown(), &self.style);
                }
            }
            ChunkKind::Char(run) => {
                let glyphs = self.glyphs(fonts);
                let shown = run.shown();
                let mut piece_start = 0;
                for (i, g) in glyphs.iter().enumerate() {
                    let next = glyphs.get(i + 1).map_or(shown.len(), |n| n.offset);
                    let is_space = &shown[g.offset..next.min(shown.len())] == " ";
                    if is_space {
                        if piece_start < g.offset {
                            let px = glyphs
                                .iter()
                                .find(|p| p.offset == piece_start)
                                .map_or(self.x, |p| p.x);
                            canvas.draw_text(
                                px - x_offset,
                                text_baseline,
                                &shown[piece_start..g.offset],
                                &self.style,
                            );
                        }
                        piece_start = next;
                    }
                }
                if piece_start < shown.len() {
                    let px = glyphs
                        .iter()
                        .find(|p| p.offset == piece_start)
                        .map_or(self.x, |p| p.x);
                    canvas.draw_text(px - x_offset, text_baseline, &shown[piece_start..], &self.style);
                }
            }
            ChunkKind::Hyphen { shown: Some(text) } => {
                canvas.draw_text(x, text_baseline, text, &self.style);
            }
            ChunkKind::Image { name } => {
                let rect = Rect::new(x, baseline - self.ascent, self.width, self.ascent + self.descent);
                canvas.draw_image(name, rect);
            }
            ChunkKind::Window { name } => {
                let rect = Rect::new(x, baseline - self.ascent, self.width, self.ascent + self.descent);
                canvas.place_window(name, rect);
            }
            ChunkKind::Cursor => {
                let rect = Rect::new(x - cursor_width / 2, top, cursor_width, line_height);
                canvas.draw_cursor(rect);
            }
            ChunkKind::Hyphen { shown: None } | ChunkKind::Tab | ChunkKind::Elided => {}
        }
    }

    /// Releases anything the chunk placed on screen that outlives a redraw.
    pub fn undisplay(&self, canvas: &mut dyn Canvas) {
        if let ChunkKind::Window { name } = &self.kind {
            canvas.unmap_window(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DrawOp, RecordingCanvas};
    use crate::model::font::CellMetrics;

    fn char_chunk(text: &str, x: i32) -> Chunk {
        let fonts = CellMetrics::new(10, 20);
        let width = fonts.text_width(0, text);
        let run = CharRun::new(Rc::from(text), 0, text.len());
        let mut chunk = Chunk::new(ChunkKind::Char(run), StyleRef::default(), x, width, text.len());
        chunk.ascent = 15;
        chunk.descent = 5;
        chunk
    }

    #[test]
    fn measure_finds_character_under_point() {
        let fonts = CellMetrics::new(10, 20);
        let chunk = char_chunk("abcd", 100);
        assert_eq!(chunk.measure(&fonts, 100), 0);
        assert_eq!(chunk.measure(&fonts, 119), 1);
        assert_eq!(chunk.measure(&fonts, 135), 3);
        assert_eq!(chunk.measure(&fonts, 500), 3);
    }

    #[test]
    fn bbox_reports_character_box() {
        let fonts = CellMetrics::new(10, 20);
        let chunk = char_chunk("héllo", 0);
        assert_eq!(chunk.bbox(&fonts, 0, 15), Rect::new(0, 0, 10, 20));
        assert_eq!(chunk.bbox(&fonts, 3, 15), Rect::new(20, 0, 10, 20));
    }

    #[test]
    fn hidden_tail_has_zero_width() {
        let fonts = CellMetrics::new(10, 20);
        let mut run = CharRun::new(Rc::from("ab\n"), 0, 3);
        run.shown_end = 2;
        let chunk = Chunk::new(ChunkKind::Char(run), StyleRef::default(), 0, 20, 3);
        let glyphs = chunk.glyphs(&fonts);
        assert_eq!(glyphs.last(), Some(&Glyph { offset: 2, x: 20, width: 0 }));
    }

    #[test]
    fn justified_run_draws_words_separately() {
        let fonts = CellMetrics::new(10, 20);
        let mut chunk = char_chunk("a b", 0);
        if let ChunkKind::Char(run) = &mut chunk.kind {
            run.spacing = vec![5];
        }
        chunk.width += 5;
        let mut canvas = RecordingCanvas::default();
        chunk.display(&mut canvas, &fonts, 0, 0, 15, 20, 2);
        assert_eq!(
            canvas.ops,
            vec![
                DrawOp::Text {
                    x: 0,
                    baseline: 15,
                    text: "a".into()
                },
                DrawOp::Text {
                    x: 25,
                    baseline: 15,
                    text: "b".into()
                },
            ]
        );
    }

    #[test]
    fn window_chunk_unmaps_on_undisplay() {
        let chunk = Chunk::new(
            ChunkKind::Window { name: Rc::from("w") },
            StyleRef::default(),
            0,
            30,
            1,
        );
        let mut canvas = RecordingCanvas::default();
        chunk.undisplay(&mut canvas);
        assert_eq!(canvas.ops, vec![DrawOp::Unmap { name: "w".into() }]);
    }
}
