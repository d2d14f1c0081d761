use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::Mutex;

use super::glyphs::GlyphRun;

/// Width cache entries kept per face before the cache is dropped wholesale.
const WIDTH_CACHE_LIMIT: usize = 4096;

/// Pixel extent of a string rendered on a single row.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

/// Measures strings for the line wrapper.
///
/// Implementations must be deterministic: the same string always measures
/// the same, otherwise wrapping stops being reproducible.
pub trait TextMetrics {
    /// Width in pixels of `text` drawn on one row.
    fn text_width(&self, text: &str) -> f32;

    /// Height of one row of text.
    fn line_height(&self) -> f32;

    fn measure(&self, text: &str) -> TextSize {
        TextSize {
            width: self.text_width(text),
            height: self.line_height(),
        }
    }
}

impl<M: TextMetrics + ?Sized> TextMetrics for &M {
    fn text_width(&self, text: &str) -> f32 {
        (**self).text_width(text)
    }

    fn line_height(&self) -> f32 {
        (**self).line_height()
    }
}

/// Fixed advance per character, whitespace included.
///
/// Useful for bitmap fonts and wherever exact widths must be known ahead of
/// time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMetrics {
    pub advance: f32,
    pub line_height: f32,
}

impl MonospaceMetrics {
    pub fn new(advance: f32, line_height: f32) -> Self {
        Self {
            advance,
            line_height,
        }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }
}

/// A loaded font at one pixel size.
///
/// Cloning is cheap; clones share the font data and the width cache. The
/// line height is the pixel size itself, so a 24px face advances rows by 24
/// pixels before line spacing.
#[derive(Clone)]
pub struct FontFace {
    id: fontdb::ID,
    font: Arc<fontdue::Font>,
    size: f32,
    widths: Arc<Mutex<HashMap<String, f32, fxhash::FxBuildHasher>>>,
}

impl FontFace {
    pub fn new(id: fontdb::ID, font: Arc<fontdue::Font>, size: f32) -> Self {
        Self {
            id,
            font,
            size,
            widths: Arc::new(Mutex::new(HashMap::default())),
        }
    }

    /// The same font at another size, with its own width cache.
    pub fn with_size(&self, size: f32) -> Self {
        Self::new(self.id, Arc::clone(&self.font), size)
    }

    pub fn id(&self) -> fontdb::ID {
        self.id
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn font(&self) -> &fontdue::Font {
        &self.font
    }

    /// Distance from the top of a row to the baseline.
    pub fn ascent(&self) -> f32 {
        self.font
            .horizontal_line_metrics(self.size)
            .map(|metrics| metrics.ascent)
            .unwrap_or(self.size)
    }
}

impl TextMetrics for FontFace {
    fn text_width(&self, text: &str) -> f32 {
        if let Some(width) = self.widths.lock().get(text) {
            return *width;
        }

        let width = GlyphRun::layout(self, text).width();

        let mut widths = self.widths.lock();
        if widths.len() >= WIDTH_CACHE_LIMIT {
            widths.clear();
        }
        widths.insert(text.to_string(), width);
        width
    }

    fn line_height(&self) -> f32 {
        self.size
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("id", &self.id)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
