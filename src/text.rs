/// Greedy height-budgeted font fallback.
pub mod fit;
/// Kerning-aware glyph placement for a single row.
pub mod glyphs;
/// String measurement.
pub mod metrics;
/// Word-fill line wrapping and long-word splitting.
pub mod wrap;

pub use fit::{FallbackFonts, FittedText, TextLayout};
pub use glyphs::{GlyphPosition, GlyphRun};
pub use metrics::{FontFace, MonospaceMetrics, TextMetrics, TextSize};
pub use wrap::{Line, split_word, wrap_text};
