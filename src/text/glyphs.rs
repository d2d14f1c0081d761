use crate::glyph_id::GlyphId;

use super::metrics::FontFace;

/// **Y-axis goes down**
///
/// `x` is measured from the left edge of the row and `y` from the baseline,
/// so the canvas only has to add the row origin and the face ascent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphPosition {
    pub glyph_id: GlyphId,
    pub x: f32,
    pub y: f32,
}

/// Glyphs of one row of text with kerning applied.
///
/// The same run backs both measuring (`FontFace::text_width`) and drawing,
/// so a line that measured as fitting is drawn exactly that wide.
pub struct GlyphRun {
    instance_length: f32,
    last_glyph: Option<(u16, fontdue::Metrics)>,
    last_origin_x: f32,
    glyphs: Vec<GlyphPosition>,
}

impl GlyphRun {
    /// Lays out `text` as a single row with `face`.
    pub fn layout(face: &FontFace, text: &str) -> Self {
        let mut run = Self {
            instance_length: 0.0,
            last_glyph: None,
            last_origin_x: 0.0,
            glyphs: Vec::with_capacity(text.len()),
        };

        for ch in text.chars() {
            run.push(face, ch);
        }

        run
    }

    /// Appends one character, advancing by the previous glyph's advance plus
    /// the kerning between the pair.
    fn push(&mut self, face: &FontFace, ch: char) {
        let font = face.font();
        let glyph_idx = font.lookup_glyph_index(ch);
        let metrics = font.metrics_indexed(glyph_idx, face.size());

        let origin_x = match self.last_glyph {
            Some((last_idx, last_metrics)) => {
                let kerning = font
                    .horizontal_kern_indexed(last_idx, glyph_idx, face.size())
                    .unwrap_or(0.0);
                self.last_origin_x + last_metrics.advance_width + kerning
            }
            None => 0.0,
        };

        // Whitespace has no ink, so a trailing space ends the run at its origin.
        self.instance_length = origin_x + metrics.width as f32 + metrics.xmin as f32;
        self.last_glyph = Some((glyph_idx, metrics));
        self.last_origin_x = origin_x;
        self.glyphs.push(GlyphPosition {
            glyph_id: GlyphId::of_face(face, glyph_idx),
            x: origin_x + metrics.xmin as f32,
            y: -(metrics.ymin as f32 + metrics.height as f32),
        });
    }

    /// Right edge of the last glyph's ink.
    pub fn width(&self) -> f32 {
        self.instance_length.max(0.0)
    }

    pub fn glyphs(&self) -> &[GlyphPosition] {
        &self.glyphs
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}
