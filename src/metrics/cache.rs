//! Per-logical-line metric cache.
//!
//! Each logical line carries a [`PixelInfo`]: its pixel height, the epoch the
//! height was computed in, and (for lines that wrap) a [`DispLineInfo`] array
//! with one entry per display line. The array lets point queries jump to the
//! display line holding a byte offset or pixel offset without re-running
//! layout, and lets an interrupted computation resume where it stopped.

use crate::layout::dline::{DLine, DLineFlags};
use crate::layout::hyphen::HyphenRule;
use crate::metrics::epoch::Epoch;
use crate::metrics::range_list::RangeList;
use crate::model::store::TextStore;

/// One display line of a wrapped logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispLineEntry {
    /// Byte offset of the display line start within the logical line.
    pub byte_offset: usize,
    /// Pixel height of the display line.
    pub height: i32,
    /// Cumulative pixel height of this and all preceding display lines.
    pub pixels: usize,
    /// Spelling change applied where this display line breaks.
    pub hyphen_rule: Option<HyphenRule>,
}

/// Display-line array of one logical line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispLineInfo {
    /// Entries in display order.
    pub entries: Vec<DispLineEntry>,
    /// Byte offset where the display line after the last entry starts.
    pub next_offset: usize,
}

impl DispLineInfo {
    /// Total pixel height of the computed entries.
    pub fn pixels(&self) -> usize {
        self.entries.last().map_or(0, |e| e.pixels)
    }

    /// Pixel offset of the top of display line `k` within the logical line.
    pub fn pixels_before(&self, k: usize) -> usize {
        if k == 0 {
            0
        } else {
            self.entries.get(k - 1).map_or(0, |e| e.pixels)
        }
    }

    /// Hyphen rule carried into display line `k`.
    pub fn carry_into(&self, k: usize) -> Option<HyphenRule> {
        if k == 0 {
            None
        } else {
            self.entries.get(k - 1).and_then(|e| e.hyphen_rule)
        }
    }
}

/// Cached metrics of one logical line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelInfo {
    /// Epoch stamp; see [`Epoch`] and [`crate::metrics::epoch::PARTIAL_EPOCH`].
    pub epoch: u32,
    /// Pixel height of the whole logical line.
    pub height: usize,
    /// Number of visible display lines; zero for a fully elided line.
    pub display_lines: usize,
    /// Display-line array, present for lines with several display lines and
    /// for lines whose computation is in progress.
    pub disp: Option<Box<DispLineInfo>>,
}

impl PixelInfo {
    /// Creates metrics holding an estimated height and a stale stamp.
    pub fn estimated(height: usize) -> Self {
        Self {
            epoch: 0,
            height,
            display_lines: 1,
            disp: None,
        }
    }

    /// Marks the metrics stale without discarding the height estimate.
    pub fn invalidate(&mut self) {
        self.epoch = 0;
        self.disp = None;
    }
}

/// Finds the display line holding `byte`: the last entry starting at or
/// before it.
pub fn search_disp_line_entry(entries: &[DispLineEntry], byte: usize) -> usize {
    entries
        .partition_point(|e| e.byte_offset <= byte)
        .saturating_sub(1)
}

/// Finds the display line holding pixel offset `y` within the logical line:
/// the first entry whose cumulative height exceeds it, clamped to the last.
pub fn search_pixel_entry(entries: &[DispLineEntry], y: usize) -> usize {
    entries
        .partition_point(|e| e.pixels <= y)
        .min(entries.len().saturating_sub(1))
}

/// Result of feeding a laid-out display line to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricWrite {
    /// The logical line's metrics are now complete and current.
    Finalized {
        /// New pixel height of the line.
        height: usize,
        /// Height before the update.
        old_height: usize,
    },
    /// Another display line was appended to a partial computation.
    Partial,
    /// The write was out of order, stale, or redundant and was dropped.
    Ignored,
}

/// Records the metrics of a freshly laid-out display line.
///
/// Display line 0 restarts the line's computation for the current epoch.
/// Display line `k > 0` is accepted only if entries `0..k` already exist for
/// the same epoch and the start offset matches; anything else is a late or
/// out-of-order write and is ignored. Layout of the last display line of a
/// logical line finalizes the height, stamps the current epoch, and removes
/// the line from `stale`.
pub fn update_line_height_information(
    store: &mut dyn TextStore,
    stale: &mut RangeList,
    epoch: Epoch,
    dline: &DLine,
) -> MetricWrite {
    let line = dline.index.line;
    let Some(info) = store.pixel_info_mut(line) else {
        return MetricWrite::Ignored;
    };
    if epoch.is_complete(info.epoch) {
        return MetricWrite::Ignored;
    }

    let k = dline.display_line_no;
    let disp = if k == 0 {
        info.epoch = epoch.partial();
        info.disp.insert(Box::default())
    } else {
        if !epoch.is_partial(info.epoch) {
            return MetricWrite::Ignored;
        }
        let Some(disp) = info.disp.as_mut() else {
            return MetricWrite::Ignored;
        };
        let start_matches = match disp.entries.get(k) {
            Some(existing) => existing.byte_offset == dline.index.byte,
            None => disp.entries.len() == k && disp.next_offset == dline.index.byte,
        };
        if !start_matches {
            return MetricWrite::Ignored;
        }
        disp.entries.truncate(k);
        disp
    };

    let pixels = disp.pixels() + dline.height.max(0) as usize;
    disp.entries.push(DispLineEntry {
        byte_offset: dline.index.byte,
        height: dline.height,
        pixels,
        hyphen_rule: dline.hyphen_rule,
    });
    disp.next_offset = dline.index.byte + dline.byte_count;

    if !dline.flags.contains(DLineFlags::LOGICAL_LINE_END) {
        return MetricWrite::Partial;
    }

    let display_lines = disp.entries.iter().filter(|e| e.height > 0).count();
    let single = disp.entries.len() == 1;
    let old_height = info.height;
    info.epoch = epoch.complete();
    if single {
        info.disp = None;
    }
    store.set_line_metric(line, pixels, display_lines);
    stale.remove(line, line);

    tracing::trace!(
        target: "textdisp::metrics",
        line,
        height = pixels,
        display_lines,
        "line metrics finalized"
    );
    MetricWrite::Finalized {
        height: pixels,
        old_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::buffer::TextBuffer;
    use crate::model::index::TextIndex;

    fn entries(heights: &[i32]) -> Vec<DispLineEntry> {
        let mut pixels = 0;
        heights
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                pixels += h as usize;
                DispLineEntry {
                    byte_offset: i * 10,
                    height: h,
                    pixels,
                    hyphen_rule: None,
                }
            })
            .collect()
    }

    fn dline(line: usize, byte: usize, k: usize, bytes: usize, height: i32, end: bool) -> DLine {
        let mut d = DLine::default();
        d.index = TextIndex::new(line, byte);
        d.display_line_no = k;
        d.byte_count = bytes;
        d.height = height;
        d.flags.set(DLineFlags::LOGICAL_LINE_END, end);
        d
    }

    #[test]
    fn search_disp_line_entry_picks_containing_line() {
        let e = entries(&[10, 10, 10]);
        assert_eq!(search_disp_line_entry(&e, 0), 0);
        assert_eq!(search_disp_line_entry(&e, 9), 0);
        assert_eq!(search_disp_line_entry(&e, 10), 1);
        assert_eq!(search_disp_line_entry(&e, 25), 2);
        assert_eq!(search_disp_line_entry(&e, 999), 2);
    }

    #[test]
    fn search_pixel_entry_uses_cumulative_heights() {
        let e = entries(&[10, 20, 5]);
        assert_eq!(search_pixel_entry(&e, 0), 0);
        assert_eq!(search_pixel_entry(&e, 9), 0);
        assert_eq!(search_pixel_entry(&e, 10), 1);
        assert_eq!(search_pixel_entry(&e, 29), 1);
        assert_eq!(search_pixel_entry(&e, 30), 2);
        assert_eq!(search_pixel_entry(&e, 500), 2);
    }

    #[test]
    fn in_order_writes_finalize_line() {
        let mut store = TextBuffer::from_text("first\nsecond line", Default::default(), 16);
        let mut stale = RangeList::new();
        stale.add(0, 1);
        let epoch = Epoch::default();

        let w0 = update_line_height_information(&mut store, &mut stale, epoch, &dline(1, 0, 0, 7, 16, false));
        assert_eq!(w0, MetricWrite::Partial);
        let w1 = update_line_height_information(&mut store, &mut stale, epoch, &dline(1, 7, 1, 5, 16, true));
        assert_eq!(
            w1,
            MetricWrite::Finalized {
                height: 32,
                old_height: 16
            }
        );

        let info = store.pixel_info(1).expect("line exists");
        assert!(epoch.is_complete(info.epoch));
        assert_eq!(info.display_lines, 2);
        assert_eq!(info.disp.as_ref().map(|d| d.entries.len()), Some(2));
        assert_eq!(store.total_pixels(), 48);
        assert_eq!(stale.to_string(), "{0,0}");
    }

    #[test]
    fn single_display_line_drops_array() {
        let mut store = TextBuffer::from_text("short", Default::default(), 16);
        let mut stale = RangeList::new();
        stale.add(0, 0);
        let epoch = Epoch::default();
        update_line_height_information(&mut store, &mut stale, epoch, &dline(0, 0, 0, 6, 20, true));
        let info = store.pixel_info(0).expect("line exists");
        assert!(info.disp.is_none());
        assert_eq!(info.height, 20);
        assert!(stale.is_empty());
    }

    #[test]
    fn out_of_order_write_is_ignored() {
        let mut store = TextBuffer::from_text("a long wrapped line", Default::default(), 16);
        let mut stale = RangeList::new();
        stale.add(0, 0);
        let epoch = Epoch::default();

        let w = update_line_height_information(&mut store, &mut stale, epoch, &dline(0, 7, 1, 5, 16, false));
        assert_eq!(w, MetricWrite::Ignored);
        assert_eq!(store.pixel_info(0).map(|i| i.epoch), Some(0));
        assert_eq!(stale.count(), 1);
    }

    #[test]
    fn write_from_previous_epoch_chain_is_ignored() {
        let mut store = TextBuffer::from_text("a long wrapped line", Default::default(), 16);
        let mut stale = RangeList::new();
        let mut epoch = Epoch::default();
        update_line_height_information(&mut store, &mut stale, epoch, &dline(0, 0, 0, 7, 16, false));
        epoch.bump();
        let w = update_line_height_information(&mut store, &mut stale, epoch, &dline(0, 7, 1, 5, 16, true));
        assert_eq!(w, MetricWrite::Ignored);
    }

    #[test]
    fn current_line_is_not_rewritten() {
        let mut store = TextBuffer::from_text("x", Default::default(), 16);
        let mut stale = RangeList::new();
        let epoch = Epoch::default();
        update_line_height_information(&mut store, &mut stale, epoch, &dline(0, 0, 0, 2, 16, true));
        let w = update_line_height_information(&mut store, &mut stale, epoch, &dline(0, 0, 0, 2, 99, true));
        assert_eq!(w, MetricWrite::Ignored);
        assert_eq!(store.pixel_info(0).map(|i| i.height), Some(16));
    }

    proptest::proptest! {
        #[test]
        fn entry_heights_sum_to_cached_height(heights in proptest::collection::vec(0i32..60, 1..40)) {
            let mut store = TextBuffer::from_text(&"x".repeat(heights.len() * 4), Default::default(), 16);
            let mut stale = RangeList::new();
            stale.add(0, 0);
            let epoch = Epoch::default();

            let last = heights.len() - 1;
            for (k, &h) in heights.iter().enumerate() {
                update_line_height_information(&mut store, &mut stale, epoch, &dline(0, k * 4, k, 4, h, k == last));
            }

            let info = store.pixel_info(0).expect("line exists");
            let expected: usize = heights.iter().map(|&h| h as usize).sum();
            proptest::prop_assert_eq!(info.height, expected);
            proptest::prop_assert_eq!(info.display_lines, heights.iter().filter(|&&h| h > 0).count());
            if let Some(disp) = info.disp.as_ref() {
                let sum: usize = disp.entries.iter().map(|e| e.height as usize).sum();
                proptest::prop_assert_eq!(sum, info.height);
            }
            proptest::prop_assert!(stale.is_empty());
            proptest::prop_assert!(epoch.is_complete(info.epoch));
        }
    }
}
