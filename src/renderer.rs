pub mod canvas;
pub mod glyph_cache;

pub use canvas::{Canvas, Ink, RectStyle};
pub use glyph_cache::GlyphCache;
