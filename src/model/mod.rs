//! Document model: positions, styles, segments, fonts and the text store.

pub mod buffer;
pub mod error;
pub mod font;
pub mod index;
pub mod segment;
pub mod store;
pub mod style;

pub use buffer::{EditSummary, TextBuffer};
pub use error::{AppError, StoreError};
pub use font::{CellMetrics, FontMetrics};
pub use index::TextIndex;
pub use segment::{Gravity, Segment, SegmentKind, INSERT_MARK};
pub use store::{LogicalLine, TextStore};
pub use style::{Justify, Style, StyleRef, TabAlign, TabStop, TabStyle, WrapMode};
