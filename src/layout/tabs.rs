//! Tab stops and retroactive tab alignment.
//!
//! A tab chunk is laid out provisionally (left-aligned tabs get their final
//! width immediately, other alignments start at zero width). Once the text
//! following the tab is known, at the next tab or at the end of the line,
//! [`adjust_for_tab`] widens the tab so that text lands where its stop's
//! alignment wants it.

use crate::layout::chunk::{Chunk, ChunkKind};
use crate::model::font::FontMetrics;
use crate::model::style::{TabAlign, TabStop, TabStyle};

/// Where a tab advances to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabTarget {
    /// Stop position in text-area pixels.
    pub stop: i32,
    /// Alignment of the following text.
    pub align: TabAlign,
}

/// Default distance between stops: eight average character widths.
pub fn default_tab_width(fonts: &dyn FontMetrics, font: u16) -> i32 {
    (8 * fonts.average_char_width(font)).max(1)
}

/// Position of stop `n`, extrapolating past the configured stops with the
/// distance between the last two (or the only) stop.
fn stop_at(tabs: &[TabStop], n: usize, default_width: i32) -> TabTarget {
    match tabs {
        [] => TabTarget {
            stop: (n as i32 + 1) * default_width,
            align: TabAlign::Left,
        },
        _ if n < tabs.len() => TabTarget {
            stop: tabs[n].position,
            align: tabs[n].align,
        },
        _ => {
            let last = tabs[tabs.len() - 1];
            let interval = repeat_interval(tabs);
            TabTarget {
                stop: last.position + (n - tabs.len() + 1) as i32 * interval,
                align: last.align,
            }
        }
    }
}

fn repeat_interval(tabs: &[TabStop]) -> i32 {
    let interval = match tabs {
        [.., a, b] => b.position - a.position,
        [only] => only.position,
        [] => 1,
    };
    interval.max(1)
}

/// First stop strictly right of `x`.
fn next_stop_after(tabs: &[TabStop], x: i32, default_width: i32) -> TabTarget {
    if let Some(t) = tabs.iter().find(|t| t.position > x) {
        return TabTarget {
            stop: t.position,
            align: t.align,
        };
    }
    match tabs.last() {
        None => TabTarget {
            stop: (x.max(0) / default_width + 1) * default_width,
            align: TabAlign::Left,
        },
        Some(last) => {
            let interval = repeat_interval(tabs);
            let k = (x - last.position) / interval + 1;
            TabTarget {
                stop: last.position + k * interval,
                align: last.align,
            }
        }
    }
}

/// Picks the stop for the tab numbered `tab_index` (zero-based within the
/// display line) that starts at `x`.
///
/// With [`TabStyle::Tabular`], the n-th tab uses the n-th stop; if the text
/// already passed that stop the tab shrinks to a single space. With
/// [`TabStyle::WordProcessor`], the tab advances to the next stop right of
/// `x`.
///
/// # Examples
///
/// ```
/// # use textdisp::layout::tabs::next_tab_stop;
/// # use textdisp::model::style::{TabStop, TabStyle};
/// let stops = [TabStop::left(40), TabStop::left(100)];
/// assert_eq!(next_tab_stop(&stops, TabStyle::Tabular, 10, 2, 64, 8).stop, 160);
/// assert_eq!(next_tab_stop(&stops, TabStyle::WordProcessor, 50, 0, 64, 8).stop, 100);
/// assert_eq!(next_tab_stop(&[], TabStyle::WordProcessor, 70, 0, 64, 8).stop, 128);
/// ```
pub fn next_tab_stop(
    tabs: &[TabStop],
    style: TabStyle,
    x: i32,
    tab_index: usize,
    default_width: i32,
    space_width: i32,
) -> TabTarget {
    match style {
        TabStyle::Tabular => {
            let target = stop_at(tabs, tab_index, default_width);
            if target.stop > x {
                target
            } else {
                TabTarget {
                    stop: x + space_width,
                    align: TabAlign::Left,
                }
            }
        }
        TabStyle::WordProcessor => next_stop_after(tabs, x, default_width),
    }
}

/// Width of the text after a tab up to its first decimal point, if any.
fn width_before_decimal(chunks: &[Chunk], text_start: i32, fonts: &dyn FontMetrics) -> Option<i32> {
    chunks.iter().find_map(|c| match &c.kind {
        ChunkKind::Char(run) => run.shown().find('.').map(|i| {
            c.x + fonts.text_width(c.style.font, &run.shown()[..i]) - text_start
        }),
        _ => None,
    })
}

/// Aligns the text following the tab chunk at `tab` to `target`, shifting
/// every chunk after the tab.
pub fn adjust_for_tab(chunks: &mut [Chunk], tab: usize, target: TabTarget, fonts: &dyn FontMetrics) {
    let Some((tab_chunk, rest)) = chunks[tab..].split_first_mut() else {
        return;
    };
    if target.align == TabAlign::Left {
        return;
    }

    let start = tab_chunk.x;
    let text_start = tab_chunk.right();
    let text_width = rest.iter().map(Chunk::right).max().unwrap_or(text_start) - text_start;
    let desired = match target.align {
        TabAlign::Left => target.stop,
        TabAlign::Right => target.stop - text_width,
        TabAlign::Center => target.stop - text_width / 2,
        TabAlign::Numeric => match width_before_decimal(rest, text_start, fonts) {
            Some(before) => target.stop - before,
            None => target.stop - text_width,
        },
    };

    let new_width = (desired - start).max(0);
    let delta = new_width - tab_chunk.width;
    tab_chunk.width = new_width;
    for chunk in rest {
        chunk.x += delta;
    }
}
