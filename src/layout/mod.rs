//! Display-line layout: break opportunities, hyphenation, chunks, tabs,
//! justification and the layout engine itself.

pub mod breaks;
pub mod chunk;
pub mod dline;
pub mod engine;
pub mod hyphen;
pub mod justify;
pub mod tabs;

pub use chunk::{Chunk, ChunkKind};
pub use dline::{DLine, DLineArena, DLineFlags, DLineId};
pub use engine::{layout_dline, locate_display_line, LayoutCx, LineStart};
pub use hyphen::HyphenRule;
