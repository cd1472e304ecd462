//! Horizontal placement of a finished display line.

use crate::layout::chunk::{Chunk, ChunkKind};
use crate::model::font::FontMetrics;
use crate::model::style::Justify;

/// Right edge of the visible content, ignoring trailing whitespace and
/// zero-width chunks. Returns `None` for a line with no content.
pub fn content_right(chunks: &[Chunk], fonts: &dyn FontMetrics) -> Option<i32> {
    for chunk in chunks.iter().rev() {
        match &chunk.kind {
            ChunkKind::Elided | ChunkKind::Cursor => continue,
            ChunkKind::Char(run) => {
                let trimmed = run.shown().trim_end();
                if trimmed.is_empty() {
                    continue;
                }
                return Some(chunk.x + fonts.text_width(chunk.style.font, trimmed));
            }
            ChunkKind::Hyphen { shown: None } => continue,
            _ => return Some(chunk.right()),
        }
    }
    None
}

/// Shifts or stretches the chunks according to `mode`.
///
/// `right_edge` is the right margin position. `last_line` is true for the
/// display line ending its logical line or ending at a mandatory break;
/// such lines are never stretched.
pub fn justify_line(
    chunks: &mut [Chunk],
    mode: Justify,
    right_edge: i32,
    last_line: bool,
    fonts: &dyn FontMetrics,
) {
    let Some(right) = content_right(chunks, fonts) else {
        return;
    };
    let slack = right_edge - right;
    if slack <= 0 {
        return;
    }
    match mode {
        Justify::Left => {}
        Justify::Right => shift(chunks, slack),
        Justify::Center => shift(chunks, slack / 2),
        Justify::Full if !last_line => stretch(chunks, slack),
        Justify::Full => {}
    }
}

fn shift(chunks: &mut [Chunk], dx: i32) {
    for chunk in chunks {
        chunk.x += dx;
    }
}

fn is_content(chunk: &Chunk) -> bool {
    match &chunk.kind {
        ChunkKind::Char(run) => !run.shown().trim_end().is_empty(),
        ChunkKind::Elided | ChunkKind::Cursor | ChunkKind::Hyphen { shown: None } => false,
        _ => true,
    }
}

/// Distributes `slack` over the interior spaces after the last tab. Each
/// space takes the ceiling of the remaining slack divided by the remaining
/// spaces.
fn stretch(chunks: &mut [Chunk], slack: i32) {
    let first = chunks
        .iter()
        .rposition(|c| matches!(c.kind, ChunkKind::Tab))
        .map_or(0, |t| t + 1);
    let tail = &mut chunks[first..];
    let Some(last_content) = tail.iter().rposition(is_content) else {
        return;
    };

    // Spaces after the last non-space character stay unstretched.
    let counts: Vec<usize> = tail
        .iter()
        .enumerate()
        .map(|(i, c)| match &c.kind {
            ChunkKind::Char(run) if i < last_content => run.shown().matches(' ').count(),
            ChunkKind::Char(run) if i == last_content => run.shown().trim_end().matches(' ').count(),
            _ => 0,
        })
        .collect();

    let mut remaining_spaces: i32 = counts.iter().sum::<usize>() as i32;
    if remaining_spaces == 0 {
        return;
    }
    let mut remaining = slack;
    let mut dx = 0;
    for (chunk, &n) in tail.iter_mut().zip(&counts) {
        chunk.x += dx;
        let ChunkKind::Char(run) = &mut chunk.kind else {
            continue;
        };
        if n == 0 {
            continue;
        }
        run.spacing.clear();
        let mut added = 0;
        for _ in 0..n {
            let share = (remaining + remaining_spaces - 1) / remaining_spaces;
            run.spacing.push(share);
            remaining -= share;
            remaining_spaces -= 1;
            added += share;
        }
        chunk.width += added;
        dx += added;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::chunk::CharRun;
    use crate::model::font::CellMetrics;
    use crate::model::style::StyleRef;
    use std::rc::Rc;

    fn run(text: &str, x: i32) -> Chunk {
        Chunk::new(
            ChunkKind::Char(CharRun::new(Rc::from(text), 0, text.len())),
            StyleRef::default(),
            x,
            text.chars().count() as i32 * 10,
            text.len(),
        )
    }

    fn spacing(chunk: &Chunk) -> &[i32] {
        match &chunk.kind {
            ChunkKind::Char(run) => &run.spacing,
            _ => &[],
        }
    }

    #[test]
    fn right_justify_ignores_trailing_space() {
        let fonts = CellMetrics::new(10, 20);
        let mut chunks = vec![run("ab ", 0)];
        justify_line(&mut chunks, Justify::Right, 100, false, &fonts);
        assert_eq!(chunks[0].x, 80);
    }

    #[test]
    fn center_splits_slack() {
        let fonts = CellMetrics::new(10, 20);
        let mut chunks = vec![run("abcd", 0)];
        justify_line(&mut chunks, Justify::Center, 100, true, &fonts);
        assert_eq!(chunks[0].x, 30);
    }

    #[test]
    fn full_justify_rounds_up_first() {
        let fonts = CellMetrics::new(10, 20);
        let mut chunks = vec![run("a b c d ", 0)];
        // content "a b c d" is 70 wide; 7 pixels over three interior spaces
        justify_line(&mut chunks, Justify::Full, 77, false, &fonts);
        assert_eq!(spacing(&chunks[0]), &[3, 2, 2]);
        assert_eq!(chunks[0].width, 87);
    }

    #[test]
    fn full_justify_spans_chunks() {
        let fonts = CellMetrics::new(10, 20);
        let mut chunks = vec![run("aa ", 0), run("bb cc", 30)];
        justify_line(&mut chunks, Justify::Full, 100, false, &fonts);
        assert_eq!(spacing(&chunks[0]), &[10]);
        assert_eq!(spacing(&chunks[1]), &[10]);
        assert_eq!(chunks[1].x, 40);
        assert_eq!(chunks[1].right(), 100);
    }

    #[test]
    fn full_justify_leaves_last_line_alone() {
        let fonts = CellMetrics::new(10, 20);
        let mut chunks = vec![run("a b", 0)];
        justify_line(&mut chunks, Justify::Full, 100, true, &fonts);
        assert!(spacing(&chunks[0]).is_empty());
        assert_eq!(chunks[0].width, 30);
    }

    #[test]
    fn full_justify_starts_after_last_tab() {
        let fonts = CellMetrics::new(10, 20);
        let mut chunks = vec![
            run("a b", 0),
            Chunk::new(ChunkKind::Tab, StyleRef::default(), 30, 20, 1),
            run("c d", 50),
        ];
        justify_line(&mut chunks, Justify::Full, 90, false, &fonts);
        assert!(spacing(&chunks[0]).is_empty());
        assert_eq!(spacing(&chunks[2]), &[10]);
    }
}
