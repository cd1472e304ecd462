//! Scrolling through a large document before its metrics are known.
//!
//! Jumping to an arbitrary fraction must only lay out the lines around the
//! new top, and the background task must fill in the rest afterwards
//! without moving the view.

use textdisp::config::DisplayConfig;
use textdisp::model::buffer::TextBuffer;
use textdisp::model::font::CellMetrics;
use textdisp::model::index::TextIndex;
use textdisp::model::store::TextStore;
use textdisp::model::style::Style;
use textdisp::TextWidget;

const LINES: usize = 10_000;

fn large_widget(line: impl Fn(usize) -> String, width: i32) -> TextWidget {
    let text = (0..LINES).map(line).collect::<Vec<_>>().join("\n");
    let buffer = TextBuffer::from_text(&text, Style::default().shared(), 20);
    TextWidget::new(
        buffer,
        Box::new(CellMetrics::new(10, 20)),
        DisplayConfig::new(width, 400),
    )
}

fn top_line(w: &mut TextWidget) -> usize {
    w.visible_lines().first().map_or(0, |l| l.index.line)
}

#[test]
fn moveto_near_end_lays_out_only_the_view() {
    let mut w = large_widget(|n| format!("line {n}"), 400);
    w.update();
    let before = w.state().stats().layouts;

    w.yview_moveto(0.95);
    w.update();
    let spent = w.state().stats().layouts - before;

    assert!(spent < 200, "jump laid out {spent} display lines");
    assert_eq!(top_line(&mut w), 9_500);
    assert!(!w.state().metrics_complete());
}

#[test]
fn moveto_end_fills_the_view() {
    let mut w = large_widget(|n| format!("line {n}"), 400);
    w.yview_moveto(1.0);
    let lines = w.visible_lines();

    assert!(lines.len() >= 20);
    assert_eq!(lines.last().map(|l| l.index.line), Some(LINES - 1));
    assert_eq!(lines.last().map(|l| l.y + l.height), Some(400));
}

#[test]
fn scheduler_completes_metrics_without_moving_the_view() {
    // Every line wraps once, so the estimate of one display line is off by
    // half until the metrics are computed.
    let mut w = large_widget(|n| format!("{n:05} aaaa bbbb cccc"), 100);
    w.yview_moveto(0.5);
    assert_eq!(top_line(&mut w), 5_000);

    w.finish_metrics();

    assert!(w.state().stale().is_empty());
    assert_eq!(w.buffer().total_pixels(), LINES * 40);
    assert_eq!(top_line(&mut w), 5_000);

    let (first, last) = w.yview();
    assert!((first - 0.5).abs() < 1e-9, "first fraction {first}");
    assert!((last - (5_000.0 * 40.0 + 400.0) / (LINES as f64 * 40.0)).abs() < 1e-9);
}

#[test]
fn see_far_line_centres_it() {
    let mut w = large_widget(|n| format!("line {n}"), 400);
    w.see(TextIndex::line_start(7_000));
    let lines = w.visible_lines();

    assert!(lines.iter().any(|l| l.index.line == 7_000));
    let top = lines[0].index.line;
    assert!(top > 6_980 && top < 7_000, "top line {top}");
}
