//! Interfaces to the embedding widget: the drawing surface and the host that
//! owns scrollbars and the event loop.
//!
//! The engine never draws pixels or schedules timers itself. Display output
//! goes through a [`Canvas`], and everything the host has to react to is
//! queued as a [`HostEvent`] and delivered through [`ViewHost`]. Recording
//! implementations of both are provided for tests and the CLI.

use crate::model::style::Style;

/// Axis-aligned rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the point lies inside.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Drawing surface receiving chunk output and block copies.
pub trait Canvas {
    /// Draws `text` with its left edge at `x` and baseline at `baseline`.
    fn draw_text(&mut self, x: i32, baseline: i32, text: &str, style: &Style);

    /// Draws an embedded image.
    fn draw_image(&mut self, name: &str, rect: Rect);

    /// Maps or moves an embedded window.
    fn place_window(&mut self, name: &str, rect: Rect);

    /// Unmaps an embedded window that scrolled out of view.
    fn unmap_window(&mut self, name: &str);

    /// Draws the insertion cursor.
    fn draw_cursor(&mut self, rect: Rect);

    /// Clears a horizontal band before it is redrawn.
    fn clear(&mut self, y: i32, height: i32);

    /// Copies a horizontal band of already drawn pixels.
    fn copy_area(&mut self, src_y: i32, dst_y: i32, height: i32);
}

/// Notification for the embedding widget.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Vertical view changed; fractions of the document height.
    YView {
        /// Fraction above the top of the view.
        first: f64,
        /// Fraction at the bottom of the view.
        last: f64,
    },
    /// Horizontal view changed.
    XView {
        /// Fraction left of the view.
        first: f64,
        /// Fraction at the right edge of the view.
        last: f64,
    },
    /// All line metrics are current; the scrollbar can be resynchronized.
    MetricsComplete {
        /// Document height in pixels.
        total_pixels: usize,
    },
    /// Stale metrics exist; the host should drive the metric task.
    ScheduleMetricUpdate,
    /// The view needs a redisplay.
    RedrawRequested,
}

/// Receiver of [`HostEvent`]s.
pub trait ViewHost {
    /// Handles one event.
    fn notify(&mut self, event: HostEvent);
}

/// Host that records every event.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    /// Events in arrival order.
    pub events: Vec<HostEvent>,
}

impl RecordingHost {
    /// The most recent vertical view fractions.
    pub fn last_yview(&self) -> Option<(f64, f64)> {
        self.events.iter().rev().find_map(|e| match e {
            HostEvent::YView { first, last } => Some((*first, *last)),
            _ => None,
        })
    }

    /// Number of metric-completion notifications received.
    pub fn completions(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, HostEvent::MetricsComplete { .. }))
            .count()
    }
}

impl ViewHost for RecordingHost {
    fn notify(&mut self, event: HostEvent) {
        self.events.push(event);
    }
}

/// A recorded canvas operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    /// [`Canvas::draw_text`].
    Text {
        /// Left edge.
        x: i32,
        /// Baseline.
        baseline: i32,
        /// Drawn text.
        text: String,
    },
    /// [`Canvas::draw_image`].
    Image {
        /// Image name.
        name: String,
        /// Target rectangle.
        rect: Rect,
    },
    /// [`Canvas::place_window`].
    Window {
        /// Window name.
        name: String,
        /// Target rectangle.
        rect: Rect,
    },
    /// [`Canvas::unmap_window`].
    Unmap {
        /// Window name.
        name: String,
    },
    /// [`Canvas::draw_cursor`].
    Cursor {
        /// Cursor rectangle.
        rect: Rect,
    },
    /// [`Canvas::clear`].
    Clear {
        /// Band top.
        y: i32,
        /// Band height.
        height: i32,
    },
    /// [`Canvas::copy_area`].
    Copy {
        /// Source band top.
        src_y: i32,
        /// Destination band top.
        dst_y: i32,
        /// Band height.
        height: i32,
    },
}

/// Canvas that records every operation.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    /// Operations in call order.
    pub ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    /// Drawn text runs in call order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Recorded block copies.
    pub fn copies(&self) -> Vec<(i32, i32, i32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Copy {
                    src_y,
                    dst_y,
                    height,
                } => Some((*src_y, *dst_y, *height)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn draw_text(&mut self, x: i32, baseline: i32, text: &str, _style: &Style) {
        self.ops.push(DrawOp::Text {
            x,
            baseline,
            text: text.to_owned(),
        });
    }

    fn draw_image(&mut self, name: &str, rect: Rect) {
        self.ops.push(DrawOp::Image {
            name: name.to_owned(),
            rect,
        });
    }

    fn place_window(&mut self, name: &str, rect: Rect) {
        self.ops.push(DrawOp::Window {
            name: name.to_owned(),
            rect,
        });
    }

    fn unmap_window(&mut self, name: &str) {
        self.ops.push(DrawOp::Unmap {
            name: name.to_owned(),
        });
    }

    fn draw_cursor(&mut self, rect: Rect) {
        self.ops.push(DrawOp::Cursor { rect });
    }

    fn clear(&mut self, y: i32, height: i32) {
        self.ops.push(DrawOp::Clear { y, height });
    }

    fn copy_area(&mut self, src_y: i32, dst_y: i32, height: i32) {
        self.ops.push(DrawOp::Copy {
            src_y,
            dst_y,
            height,
        });
    }
}
