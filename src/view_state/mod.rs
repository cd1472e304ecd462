//! View-state layer: the visible display lines and everything that moves or
//! queries them.
//!
//! # Module Structure
//!
//! - `viewport`: the visible list, its caches and redisplay
//! - `measure`: vertical distances between display lines
//! - `scroll`: vertical and horizontal scrolling, `yview`, `see`
//! - `hit_test`: character boxes, line geometry, point lookup and counting
//!
//! All operations are inherent methods of [`crate::display::DisplayState`].

pub mod measure;
pub mod scroll;
pub mod viewport;

pub use hit_test::LineBox;
pub use scroll::ScrollUnit;
pub use viewport::{Viewport, CACHE_SIZE};
