//! textdisp
//!
//! Incremental layout, line-metric caching and scrolling for a text view
//! over documents of any size.
//!
//! The library is organized in layers. [`model`] holds the document:
//! logical lines of styled segments behind the [`model::TextStore`] trait.
//! [`layout`] turns one logical line at a time into display lines of
//! chunks. [`metrics`] caches per-line pixel heights and tracks which lines
//! are stale, and [`scheduler`] brings them up to date in bounded slices.
//! [`view_state`] keeps the visible display lines, scrolls and answers
//! geometry queries. [`display::DisplayState`] ties these together, and
//! [`widget::TextWidget`] wraps it with a document and fonts.

pub mod config;
pub mod display;
pub mod host;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod scheduler;
pub mod view_state;
pub mod widget;

pub use display::DisplayState;
pub use widget::TextWidget;
