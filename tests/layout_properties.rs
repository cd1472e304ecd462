//! Property-based tests for display-line layout.
//!
//! Tests validate:
//! 1. Layout is deterministic
//! 2. Chunk byte counts of a display line sum to the bytes it consumes
//! 3. Display lines tile their logical line, each consuming at least one byte,
//!    also across soft hyphens, images and windows wider than the view
//! 4. Character wrapping never overflows the view width

use proptest::prelude::*;
use textdisp::config::DisplayConfig;
use textdisp::layout::dline::{DLine, DLineFlags};
use textdisp::layout::engine::{layout_dline, LayoutCx, LineStart};
use textdisp::metrics::epoch::Epoch;
use textdisp::model::buffer::TextBuffer;
use textdisp::model::font::CellMetrics;
use textdisp::model::index::TextIndex;
use textdisp::model::segment::Segment;
use textdisp::model::store::TextStore;
use textdisp::model::style::{HyphenRules, Style, WrapMode};
use textdisp::widget::TextWidget;

// ===== Helper Functions =====

fn wrap_mode() -> impl Strategy<Value = WrapMode> {
    prop_oneof![
        Just(WrapMode::None),
        Just(WrapMode::Char),
        Just(WrapMode::Word),
        Just(WrapMode::Codepoint),
    ]
}

/// One piece of a generated logical line.
#[derive(Debug, Clone)]
enum Part {
    Text(String),
    Hyphen,
    Image(i32),
    Window(i32),
}

fn part() -> impl Strategy<Value = Part> {
    let word = prop_oneof![
        4 => "[a-z]{1,12}",
        1 => Just("schiff".to_owned()),
        1 => Just("日本語".to_owned()),
        1 => Just("héllo".to_owned()),
    ];
    let sep = prop_oneof![8 => Just(" "), 1 => Just("  "), 1 => Just("\t")];
    prop_oneof![
        8 => (word, sep).prop_map(|(w, s)| Part::Text(format!("{w}{s}"))),
        2 => Just(Part::Hyphen),
        1 => (5i32..120).prop_map(Part::Image),
        1 => (5i32..120).prop_map(Part::Window),
    ]
}

fn line_parts() -> impl Strategy<Value = Vec<Part>> {
    prop::collection::vec(part(), 0..30)
}

/// Builds a one-line buffer from `parts`. Soft hyphens carry every
/// spelling rule so that rule substitutions get exercised too.
fn build(parts: &[Part], wrap: WrapMode, width: i32) -> (TextBuffer, CellMetrics, DisplayConfig) {
    let text: String = parts
        .iter()
        .filter_map(|p| match p {
            Part::Text(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    let (mut buffer, fonts, config) = setup(&text, wrap, width);
    let hyphen_style = Style {
        wrap,
        hyphen_rules: HyphenRules::all(),
        ..Style::default()
    }
    .shared();
    let style = buffer.default_style().clone();

    let mut byte = 0;
    for (n, p) in parts.iter().enumerate() {
        let segment = match p {
            Part::Text(t) => {
                byte += t.len();
                continue;
            }
            Part::Hyphen => Segment::hyphen(hyphen_style.clone()),
            Part::Image(w) => Segment::image(&format!("img{n}"), *w, 16, 12, style.clone()),
            Part::Window(w) => Segment::window(&format!("win{n}"), *w, 24, style.clone()),
        };
        buffer
            .insert_segment(TextIndex::new(0, byte), segment)
            .expect("generated offsets are in order");
        byte += 1;
    }
    (buffer, fonts, config)
}

/// Lays out every display line of line 0.
fn layout_all(buffer: &TextBuffer, fonts: &CellMetrics, config: &DisplayConfig) -> Vec<DLine> {
    let cx = LayoutCx::new(buffer, fonts, config, Epoch::default());
    let mut out = Vec::new();
    let mut start = LineStart::logical(0);
    loop {
        let mut dline = DLine::default();
        layout_dline(&cx, start, &mut dline);
        let done = dline.flags.contains(DLineFlags::LOGICAL_LINE_END);
        start = LineStart::after(&dline);
        out.push(dline);
        if done || out.len() > 1000 {
            return out;
        }
    }
}

fn setup(text: &str, wrap: WrapMode, width: i32) -> (TextBuffer, CellMetrics, DisplayConfig) {
    let style = Style {
        wrap,
        ..Style::default()
    };
    (
        TextBuffer::from_text(text, style.shared(), 20),
        CellMetrics::new(10, 20),
        DisplayConfig::new(width, 200),
    )
}

// ===== Property 1-3: Determinism and Tiling =====

proptest! {
    #[test]
    fn layout_is_deterministic(parts in line_parts(), wrap in wrap_mode(), width in 0i32..300) {
        let (buffer, fonts, config) = build(&parts, wrap, width);
        let first = layout_all(&buffer, &fonts, &config);
        let second = layout_all(&buffer, &fonts, &config);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn chunk_bytes_sum_to_consumed_span(parts in line_parts(), wrap in wrap_mode(), width in 0i32..300) {
        let (buffer, fonts, config) = build(&parts, wrap, width);
        for dline in layout_all(&buffer, &fonts, &config) {
            let sum: usize = dline.chunks.iter().map(|c| c.byte_count).sum();
            prop_assert_eq!(sum, dline.byte_count);
        }
    }

    #[test]
    fn display_lines_tile_logical_line(parts in line_parts(), wrap in wrap_mode(), width in 0i32..300) {
        let (buffer, fonts, config) = build(&parts, wrap, width);
        let lines = layout_all(&buffer, &fonts, &config);
        let byte_len = buffer.line(0).map_or(0, |l| l.byte_len());

        let mut next = 0;
        for (k, dline) in lines.iter().enumerate() {
            prop_assert_eq!(dline.index.byte, next, "display line {} starts out of place", k);
            prop_assert_eq!(dline.display_line_no, k);
            prop_assert!(dline.byte_count > 0, "display line {} consumed nothing", k);
            next += dline.byte_count;
        }
        prop_assert_eq!(next, byte_len);
        prop_assert!(lines.last().is_some_and(|d| d.flags.contains(DLineFlags::LOGICAL_LINE_END)));
        prop_assert!(lines.len() <= byte_len);
    }
}

// ===== Property 4: Width Bound =====

proptest! {
    #[test]
    fn char_wrap_fits_view_width(text in "[a-z ]{0,200}", width in 10i32..300) {
        let (buffer, fonts, config) = setup(&text, WrapMode::Char, width);
        for dline in layout_all(&buffer, &fonts, &config) {
            prop_assert!(dline.length <= width, "line of {} px in a {} px view", dline.length, width);
        }
    }
}

#[test]
fn word_wrap_snapshot() {
    let buffer = TextBuffer::from_text(
        "the quick brown fox jumps over the lazy dog",
        Style::default().shared(),
        20,
    );
    let mut widget = TextWidget::new(buffer, Box::new(CellMetrics::new(10, 20)), DisplayConfig::new(100, 200));
    let out = widget
        .visible_lines()
        .into_iter()
        .map(|l| format!("{:03} [{}]", l.y, l.text))
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(out, @r"
    000 [the quick ]
    020 [brown fox ]
    040 [jumps over ]
    060 [the lazy ]
    080 [dog]
    ");
}
