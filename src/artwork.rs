//! Album art preparation: decode, shrink to the panel, reduce to black and
//! white.

use image::{DynamicImage, GrayImage, imageops};

use crate::error::ArtworkError;

/// Decodes downloaded artwork and fits it inside `max_size`.
///
/// The aspect ratio is kept and images already small enough are left at
/// their size. The result is dithered to pure black and white.
pub fn prepare(bytes: &[u8], max_size: [u32; 2]) -> Result<GrayImage, ArtworkError> {
    let decoded = image::load_from_memory(bytes)?;
    log::debug!(
        "Artwork dimensions: {}x{}",
        decoded.width(),
        decoded.height()
    );

    let [max_width, max_height] = max_size;
    if max_width == 0 || max_height == 0 {
        return Ok(GrayImage::new(0, 0));
    }

    let fitted = if decoded.width() > max_width || decoded.height() > max_height {
        decoded.resize(max_width, max_height, imageops::FilterType::CatmullRom)
    } else {
        decoded
    };

    Ok(to_bilevel(fitted))
}

/// Converts to grayscale and applies Floyd–Steinberg dithering so every pixel
/// ends up 0 or 255.
pub fn to_bilevel(image: DynamicImage) -> GrayImage {
    let mut gray = image.into_luma8();
    imageops::dither(&mut gray, &imageops::BiLevel);
    gray
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    fn png_bytes(image: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn large_art_is_shrunk_keeping_aspect_ratio() {
        let art = RgbImage::from_pixel(300, 150, Rgb([200, 30, 30]));
        let prepared = prepare(&png_bytes(&art), [250, 122]).unwrap();
        assert_eq!(prepared.dimensions(), (244, 122));
    }

    #[test]
    fn small_art_is_not_enlarged() {
        let art = RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]));
        let prepared = prepare(&png_bytes(&art), [250, 122]).unwrap();
        assert_eq!(prepared.dimensions(), (64, 64));
    }

    #[test]
    fn output_is_strictly_black_and_white() {
        let art = RgbImage::from_fn(40, 40, |x, y| Rgb([(x * 6) as u8, (y * 6) as u8, 128]));
        let prepared = prepare(&png_bytes(&art), [40, 40]).unwrap();
        assert!(prepared.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert!(prepared.pixels().any(|p| p.0[0] == 0));
        assert!(prepared.pixels().any(|p| p.0[0] == 255));
    }

    #[test]
    fn undecodable_bytes_are_an_artwork_error() {
        let err = prepare(b"<html>not an image</html>", [10, 10]).unwrap_err();
        assert!(matches!(err, ArtworkError::Decode(_)));
    }
}
