//! Line metric bookkeeping: dirty-line tracking, epochs, per-line caches and
//! the pixel-offset index.

pub mod cache;
pub mod epoch;
pub mod height_index;
pub mod range_list;

pub use cache::{DispLineEntry, DispLineInfo, MetricWrite, PixelInfo};
pub use epoch::{Epoch, PARTIAL_EPOCH};
pub use height_index::HeightIndex;
pub use range_list::{Range, RangeList};
