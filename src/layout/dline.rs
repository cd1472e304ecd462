//! Display lines and the arena that recycles them.

use crate::layout::chunk::Chunk;
use crate::layout::hyphen::HyphenRule;
use crate::model::index::TextIndex;
use bitflags::bitflags;

bitflags! {
    /// Status bits of a display line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DLineFlags: u16 {
        /// First display line of its logical line.
        const LOGICAL_LINE_START = 1 << 0;
        /// Last display line of its logical line.
        const LOGICAL_LINE_END = 1 << 1;
        /// Topmost line of the viewport.
        const TOP_LINE = 1 << 2;
        /// Bottom line of the viewport.
        const BOTTOM_LINE = 1 << 3;
        /// Holds the insertion cursor.
        const HAS_CURSOR = 1 << 4;
        /// Every byte is elided; the line has no height.
        const ELIDED = 1 << 5;
        /// Ends at a mandatory break inside the logical line.
        const MANDATORY_BREAK = 1 << 6;
        /// Chunks have been drawn and not undrawn.
        const DISPLAYED = 1 << 7;
    }
}

/// Bucket of consecutive chunks, for byte-offset lookups without scanning
/// every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Section {
    /// Index of the first chunk.
    pub first_chunk: usize,
    /// Number of chunks.
    pub chunk_count: usize,
    /// Byte offset of the first chunk from the line start.
    pub byte_offset: usize,
    /// Bytes covered by the section.
    pub byte_count: usize,
}

/// Minimum chunks per section.
pub const MIN_CHUNKS_PER_SECTION: usize = 10;
/// Maximum sections per display line.
pub const MAX_SECTIONS: usize = 20;

/// One laid-out display line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DLine {
    /// Start of the line.
    pub index: TextIndex,
    /// Bytes of the logical line consumed.
    pub byte_count: usize,
    /// Position among the display lines of its logical line.
    pub display_line_no: usize,
    /// Top edge in viewport coordinates, once placed.
    pub y: i32,
    /// Position the line was last drawn at.
    pub old_y: Option<i32>,
    /// Height including spacing.
    pub height: i32,
    /// Baseline offset from the top edge.
    pub baseline: i32,
    /// Spacing above the text.
    pub space_above: i32,
    /// Spacing below the text.
    pub space_below: i32,
    /// Right edge of the rightmost chunk.
    pub length: i32,
    /// Chunks in display order.
    pub chunks: Vec<Chunk>,
    /// Chunk buckets.
    pub sections: Vec<Section>,
    /// Status bits.
    pub flags: DLineFlags,
    /// Epoch the line was laid out in.
    pub epoch: u32,
    /// Spelling change applied where this line breaks, carried to the next.
    pub hyphen_rule: Option<HyphenRule>,
}

impl DLine {
    /// Clears the line for reuse, keeping allocations.
    pub fn reset(&mut self) {
        self.index = TextIndex::default();
        self.byte_count = 0;
        self.display_line_no = 0;
        self.y = 0;
        self.old_y = None;
        self.height = 0;
        self.baseline = 0;
        self.space_above = 0;
        self.space_below = 0;
        self.length = 0;
        self.chunks.clear();
        self.sections.clear();
        self.flags = DLineFlags::empty();
        self.epoch = 0;
        self.hyphen_rule = None;
    }

    /// Index just past the line's last byte.
    pub fn end_index(&self) -> TextIndex {
        self.index.with_byte(self.index.byte + self.byte_count)
    }

    /// Start of the display line that follows this one.
    pub fn next_index(&self) -> TextIndex {
        if self.flags.contains(DLineFlags::LOGICAL_LINE_END) {
            TextIndex::line_start(self.index.line + 1)
        } else {
            self.end_index()
        }
    }

    /// Returns true if `index` lies in this display line. The position at
    /// the very end of a logical line belongs to its last display line.
    pub fn contains(&self, index: TextIndex) -> bool {
        index.line == self.index.line
            && index.byte >= self.index.byte
            && (index.byte < self.index.byte + self.byte_count
                || (self.byte_count == 0 && index.byte == self.index.byte))
    }

    /// Returns true if the line is fully elided.
    pub fn is_elided(&self) -> bool {
        self.flags.contains(DLineFlags::ELIDED)
    }

    /// Buckets the chunks into sections of at least
    /// [`MIN_CHUNKS_PER_SECTION`] chunks and at most [`MAX_SECTIONS`] sections.
    pub fn build_sections(&mut self) {
        self.sections.clear();
        let n = self.chunks.len();
        if n == 0 {
            return;
        }
        let per = MIN_CHUNKS_PER_SECTION.max(n.div_ceil(MAX_SECTIONS));
        let mut first = 0;
        while first < n {
            let count = per.min(n - first);
            let chunks = &self.chunks[first..first + count];
            self.sections.push(Section {
                first_chunk: first,
                chunk_count: count,
                byte_offset: chunks[0].byte_offset,
                byte_count: chunks.iter().map(|c| c.byte_count).sum(),
            });
            first += count;
        }
    }

    /// Index of the chunk covering byte offset `offset` from the line start.
    /// Zero-width chunks at the offset are skipped in favor of the chunk
    /// that actually holds the byte; an offset at the end maps to the last
    /// chunk.
    pub fn find_chunk(&self, offset: usize) -> Option<usize> {
        if self.chunks.is_empty() {
            return None;
        }
        let s = self
            .sections
            .partition_point(|s| s.byte_offset + s.byte_count <= offset)
            .min(self.sections.len().saturating_sub(1));
        let (first, count) = self
            .sections
            .get(s)
            .map_or((0, self.chunks.len()), |sec| (sec.first_chunk, sec.chunk_count));
        let found = self.chunks[first..first + count]
            .iter()
            .position(|c| offset < c.byte_offset + c.byte_count)
            .map(|i| first + i);
        found.or(Some(self.chunks.len() - 1))
    }
}

/// Stable handle of a display line in a [`DLineArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DLineId(u32);

/// Arena of display lines with a free list.
///
/// Lines are handed out by [`DLineArena::alloc`] and returned with
/// [`DLineArena::free`]; a freed slot keeps its allocations for the next
/// line.
#[derive(Debug, Default)]
pub struct DLineArena {
    slots: Vec<DLine>,
    in_use: Vec<bool>,
    free: Vec<DLineId>,
}

impl DLineArena {
    /// Empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a cleared line from the free list or grows the arena.
    pub fn alloc(&mut self) -> DLineId {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.slots.push(DLine::default());
                self.in_use.push(false);
                DLineId((self.slots.len() - 1) as u32)
            }
        };
        debug_assert!(!self.in_use[id.0 as usize], "slot handed out twice");
        self.in_use[id.0 as usize] = true;
        self.slots[id.0 as usize].reset();
        id
    }

    /// Returns a line to the free list.
    pub fn free(&mut self, id: DLineId) {
        let slot = id.0 as usize;
        debug_assert!(self.in_use[slot], "double free of display line");
        self.in_use[slot] = false;
        self.slots[slot].chunks.clear();
        self.free.push(id);
    }

    /// The line behind `id`.
    pub fn get(&self, id: DLineId) -> &DLine {
        &self.slots[id.0 as usize]
    }

    /// The line behind `id`, mutably.
    pub fn get_mut(&mut self, id: DLineId) -> &mut DLine {
        &mut self.slots[id.0 as usize]
    }

    /// Number of lines currently handed out.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of recycled lines waiting in the free list.
    pub fn pooled(&self) -> usize {
        self.free.len()
    }
}
