use std::path::Path;

use euclid::default::{Box2D, Point2D};
use image::{GrayImage, Luma};

use crate::{
    artwork,
    error::ArtworkError,
    text::{FontFace, GlyphRun, TextLayout},
};

use super::glyph_cache::GlyphCache;

/// Glyph coverage at or above this value is inked.
const COVERAGE_THRESHOLD: u8 = 128;

/// The two colours an e-paper panel can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ink {
    Black,
    White,
}

impl Ink {
    pub fn luma(self) -> Luma<u8> {
        match self {
            Ink::Black => Luma([0]),
            Ink::White => Luma([255]),
        }
    }
}

/// How [`Canvas::draw_rectangle`] paints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectStyle {
    pub fill: Option<Ink>,
    pub outline: Option<Ink>,
    /// Outline thickness in pixels, drawn inside the rectangle.
    pub outline_width: u32,
}

impl Default for RectStyle {
    /// White box with a one pixel black border.
    fn default() -> Self {
        Self {
            fill: Some(Ink::White),
            outline: Some(Ink::Black),
            outline_width: 1,
        }
    }
}

/// In-memory frame the screen is composed on before it goes to the panel.
///
/// Pixels are 8-bit but only ever black or white. Everything drawn is
/// clipped to the canvas; nothing here does layout.
pub struct Canvas {
    image: GrayImage,
    glyph_cache: GlyphCache,
}

impl Canvas {
    /// Creates a white canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::from_pixel(width, height, Ink::White.luma()),
            glyph_cache: GlyphCache::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Resets every pixel to white.
    pub fn clear(&mut self) {
        log::debug!("Clearing canvas.");
        self.fill(Ink::White);
    }

    pub fn fill(&mut self, ink: Ink) {
        let luma = ink.luma();
        for pixel in self.image.pixels_mut() {
            *pixel = luma;
        }
    }

    /// Draws one row of text with its top-left corner at `origin`.
    pub fn draw_text(&mut self, origin: Point2D<i32>, text: &str, face: &FontFace) {
        log::debug!("Drawing text \"{text}\"");

        let run = GlyphRun::layout(face, text);
        let baseline = origin.y as f32 + face.ascent();
        let Self { image, glyph_cache } = self;

        for glyph in run.glyphs() {
            let Some(cached) = glyph_cache.get(&glyph.glyph_id, face.font()) else {
                continue;
            };

            let glyph_x = origin.x as f32 + glyph.x;
            let glyph_y = baseline + glyph.y;

            for row in 0..cached.height {
                let iy = (glyph_y + row as f32).floor() as i64;
                if iy < 0 || iy >= i64::from(image.height()) {
                    continue;
                }

                for col in 0..cached.width {
                    if cached.data[row * cached.width + col] < COVERAGE_THRESHOLD {
                        continue;
                    }

                    let ix = (glyph_x + col as f32).floor() as i64;
                    if ix < 0 || ix >= i64::from(image.width()) {
                        continue;
                    }

                    image.put_pixel(ix as u32, iy as u32, Ink::Black.luma());
                }
            }
        }
    }

    /// Draws the lines of `layout` top-down starting at `origin`.
    ///
    /// Returns the y coordinate just below the last line, spacing included,
    /// which is where the next block of text can start.
    pub fn draw_layout(&mut self, origin: Point2D<i32>, face: &FontFace, layout: &TextLayout) -> i32 {
        for (top, line) in layout.positioned_lines() {
            let y = origin.y + top.round() as i32;
            self.draw_text(Point2D::new(origin.x, y), &line.text, face);
        }

        origin.y + layout.total_height.round() as i32
    }

    /// Wraps and draws `text` in one go.
    ///
    /// Without a `max_width` the text wraps at the right edge of the canvas.
    /// Returns the y coordinate below the last line.
    pub fn draw_wrapped_text(
        &mut self,
        origin: Point2D<i32>,
        text: &str,
        face: &FontFace,
        max_width: Option<f32>,
        line_spacing: f32,
    ) -> i32 {
        let max_width = max_width.unwrap_or((self.width() as i32 - origin.x) as f32);
        let layout = TextLayout::wrap(text, face, max_width, line_spacing);
        self.draw_layout(origin, face, &layout)
    }

    /// Paints `rect` (min inclusive, max exclusive).
    pub fn draw_rectangle(&mut self, rect: Box2D<i32>, style: RectStyle) {
        log::debug!("Drawing a rectangle from {:?} to {:?}.", rect.min, rect.max);

        let border = style.outline_width as i32;
        let clip = Box2D::new(
            Point2D::new(0, 0),
            Point2D::new(self.width() as i32, self.height() as i32),
        );
        let Some(visible) = rect.intersection(&clip) else {
            return;
        };

        for y in visible.min.y..visible.max.y {
            for x in visible.min.x..visible.max.x {
                let edge_distance = (x - rect.min.x)
                    .min(rect.max.x - 1 - x)
                    .min(y - rect.min.y)
                    .min(rect.max.y - 1 - y);

                let ink = if edge_distance < border {
                    style.outline.or(style.fill)
                } else {
                    style.fill
                };

                if let Some(ink) = ink {
                    self.image.put_pixel(x as u32, y as u32, ink.luma());
                }
            }
        }
    }

    /// Pastes `image` with its top-left corner at `position`, replacing the
    /// pixels underneath.
    pub fn draw_image(&mut self, position: Point2D<i32>, image: &GrayImage) {
        log::debug!(
            "Drawing {}x{} image at {:?}.",
            image.width(),
            image.height(),
            position
        );
        image::imageops::replace(&mut self.image, image, position.x.into(), position.y.into());
    }

    /// Loads a bitmap file, reduces it to black and white and pastes it.
    pub fn draw_image_file(&mut self, position: Point2D<i32>, path: &Path) -> Result<(), ArtworkError> {
        log::info!("Drawing bitmap located at {}", path.display());

        let bitmap = image::open(path).map_err(|source| ArtworkError::File {
            path: path.to_path_buf(),
            source,
        })?;
        self.draw_image(position, &artwork::to_bilevel(bitmap));
        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_storage::test_face;

    fn black_pixels(canvas: &Canvas) -> usize {
        canvas.image().pixels().filter(|p| p.0[0] == 0).count()
    }

    #[test]
    fn new_canvas_is_white() {
        let canvas = Canvas::new(8, 4);
        assert_eq!(canvas.width(), 8);
        assert_eq!(canvas.height(), 4);
        assert_eq!(black_pixels(&canvas), 0);
    }

    #[test]
    fn fill_and_clear() {
        let mut canvas = Canvas::new(3, 3);
        canvas.fill(Ink::Black);
        assert_eq!(black_pixels(&canvas), 9);
        canvas.clear();
        assert_eq!(black_pixels(&canvas), 0);
    }

    #[test]
    fn outlined_rectangle_keeps_a_white_interior() {
        let mut canvas = Canvas::new(10, 10);
        canvas.draw_rectangle(
            Box2D::new(Point2D::new(1, 1), Point2D::new(6, 6)),
            RectStyle::default(),
        );

        // 5x5 box, one pixel border: 25 - 9 interior pixels.
        assert_eq!(black_pixels(&canvas), 16);
        assert_eq!(canvas.image().get_pixel(1, 1).0[0], 0);
        assert_eq!(canvas.image().get_pixel(3, 3).0[0], 255);
        assert_eq!(canvas.image().get_pixel(6, 6).0[0], 255);
    }

    #[test]
    fn thick_outline_and_filled_rectangle() {
        let mut canvas = Canvas::new(10, 10);
        canvas.draw_rectangle(
            Box2D::new(Point2D::new(0, 0), Point2D::new(6, 6)),
            RectStyle {
                fill: None,
                outline: Some(Ink::Black),
                outline_width: 2,
            },
        );
        assert_eq!(black_pixels(&canvas), 36 - 4);

        canvas.draw_rectangle(
            Box2D::new(Point2D::new(0, 0), Point2D::new(10, 10)),
            RectStyle {
                fill: Some(Ink::Black),
                outline: None,
                outline_width: 0,
            },
        );
        assert_eq!(black_pixels(&canvas), 100);
    }

    #[test]
    fn rectangle_is_clipped_to_the_canvas() {
        let mut canvas = Canvas::new(4, 4);
        canvas.draw_rectangle(
            Box2D::new(Point2D::new(-10, -10), Point2D::new(2, 2)),
            RectStyle {
                fill: Some(Ink::Black),
                outline: None,
                outline_width: 0,
            },
        );
        assert_eq!(black_pixels(&canvas), 4);

        canvas.draw_rectangle(
            Box2D::new(Point2D::new(10, 10), Point2D::new(20, 20)),
            RectStyle::default(),
        );
        assert_eq!(black_pixels(&canvas), 4);
    }

    #[test]
    fn pasted_image_replaces_and_clips() {
        let mut canvas = Canvas::new(4, 4);
        let patch = GrayImage::from_pixel(3, 3, Ink::Black.luma());

        canvas.draw_image(Point2D::new(2, 2), &patch);
        assert_eq!(black_pixels(&canvas), 4);

        canvas.draw_image(Point2D::new(-2, -2), &patch);
        assert_eq!(black_pixels(&canvas), 5);

        let white = GrayImage::from_pixel(4, 4, Ink::White.luma());
        canvas.draw_image(Point2D::new(0, 0), &white);
        assert_eq!(black_pixels(&canvas), 0);
    }

    #[test]
    fn bitmap_file_is_loaded_as_black_and_white() {
        let path = std::env::temp_dir().join(format!("nowplaying-canvas-{}.png", std::process::id()));
        let mut source = GrayImage::from_pixel(2, 2, Luma([10]));
        source.put_pixel(1, 1, Luma([250]));
        source.save(&path).unwrap();

        let mut canvas = Canvas::new(4, 4);
        let result = canvas.draw_image_file(Point2D::new(1, 1), &path);
        std::fs::remove_file(&path).ok();
        result.unwrap();

        assert_eq!(canvas.image().get_pixel(1, 1).0[0], 0);
        assert_eq!(canvas.image().get_pixel(2, 2).0[0], 255);
        assert!(canvas.image().pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn missing_bitmap_file_is_an_error() {
        let mut canvas = Canvas::new(4, 4);
        let err = canvas
            .draw_image_file(Point2D::new(0, 0), Path::new("no/such/bitmap.bmp"))
            .unwrap_err();
        assert!(matches!(err, ArtworkError::File { .. }));
        assert_eq!(black_pixels(&canvas), 0);
    }

    #[test]
    fn text_is_inked_inside_its_row() {
        let Some(face) = test_face(16.0) else {
            return;
        };

        let mut canvas = Canvas::new(120, 40);
        canvas.draw_text(Point2D::new(0, 10), "Hello", &face);
        assert!(black_pixels(&canvas) > 0);

        let above = (0..120).all(|x| (0..8).all(|y| canvas.image().get_pixel(x, y).0[0] == 255));
        assert!(above, "glyphs leaked above the row");
    }

    #[test]
    fn layout_returns_the_next_free_row() {
        let Some(face) = test_face(16.0) else {
            return;
        };

        let layout = TextLayout::wrap("one two three four", &face, 50.0, 2.0);
        let mut canvas = Canvas::new(120, 200);
        let next = canvas.draw_layout(Point2D::new(0, 10), &face, &layout);
        assert_eq!(next, 10 + layout.total_height.round() as i32);
        assert_eq!(next, 10 + layout.lines.len() as i32 * 18);
    }

    #[test]
    fn wrapped_text_stays_inside_its_width() {
        let Some(face) = test_face(24.0) else {
            return;
        };

        let mut canvas = Canvas::new(250, 122);
        let text = "Jumping jackrabbits WAVE fjord yay";
        let next = canvas.draw_wrapped_text(Point2D::new(0, 0), text, &face, Some(120.0), 0.0);

        let lines = TextLayout::wrap(text, &face, 120.0, 0.0).lines.len() as i32;
        assert!(lines >= 2);
        assert_eq!(next, lines * 24);

        let ink_right = canvas
            .image()
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] == 0)
            .map(|(x, _, _)| x)
            .max()
            .unwrap();
        assert!(ink_right < 120, "ink reaches x = {ink_right}");
    }
}
