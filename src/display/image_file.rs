use std::path::PathBuf;

use image::{GrayImage, Luma};

use crate::error::HardwareError;

use super::driver::{EpdDriver, RefreshMode, buffer_len, line_width};

/// Panel stand-in that writes every frame to a PNG file.
///
/// The buffer is unpacked exactly as the panel would read it, so the file
/// shows the native portrait orientation, rotation included.
pub struct ImageFileDriver {
    native_size: [u32; 2],
    path: PathBuf,
    frames: usize,
}

impl ImageFileDriver {
    pub fn new(native_size: [u32; 2], path: PathBuf) -> Self {
        Self {
            native_size,
            path,
            frames: 0,
        }
    }

    /// Frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    fn write(&mut self, frame: &GrayImage) -> Result<(), HardwareError> {
        frame.save(&self.path)?;
        self.frames += 1;
        Ok(())
    }

    /// Inverse of the controller's packing.
    pub fn unpack(native_size: [u32; 2], buffer: &[u8]) -> Result<GrayImage, HardwareError> {
        let expected = buffer_len(native_size);
        if buffer.len() != expected {
            return Err(HardwareError::BufferLength {
                expected,
                actual: buffer.len(),
            });
        }

        let [width, height] = native_size;
        let stride = line_width(width);
        Ok(GrayImage::from_fn(width, height, |x, y| {
            let byte = buffer[(x / 8) as usize + y as usize * stride];
            if byte & (0x80 >> (x % 8)) == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        }))
    }
}

impl EpdDriver for ImageFileDriver {
    fn native_size(&self) -> [u32; 2] {
        self.native_size
    }

    fn init(&mut self) -> Result<(), HardwareError> {
        log::debug!("Frame output: {}", self.path.display());
        Ok(())
    }

    fn reset(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }

    fn clear(&mut self, color: u8) -> Result<(), HardwareError> {
        let [width, height] = self.native_size;
        let luma = if color == 0 { 0 } else { 255 };
        self.write(&GrayImage::from_pixel(width, height, Luma([luma])))
    }

    fn display(&mut self, buffer: &[u8], mode: RefreshMode) -> Result<(), HardwareError> {
        let frame = Self::unpack(self.native_size, buffer)?;
        self.write(&frame)?;
        log::info!(
            "Wrote frame {} ({mode:?} refresh) to {}",
            self.frames,
            self.path.display()
        );
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }

    fn release(&mut self) -> Result<(), HardwareError> {
        log::debug!("Released frame output after {} frames.", self.frames);
        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayController, Orientation};

    #[test]
    fn wrong_buffer_length_is_a_hardware_error() {
        let err = ImageFileDriver::unpack([10, 2], &[0xFF; 3]).unwrap_err();
        assert!(matches!(
            err,
            HardwareError::BufferLength {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn unwritable_output_is_an_image_error() {
        let path = std::env::temp_dir()
            .join("nowplaying-no-such-dir")
            .join("frame.png");
        let mut driver = ImageFileDriver::new([8, 2], path);

        let err = driver.display(&[0xFF; 2], RefreshMode::Full).unwrap_err();
        assert!(matches!(err, HardwareError::Image(_)));
        assert_eq!(driver.frames(), 0);
    }

    #[test]
    fn frames_round_trip_through_a_png_file() {
        let path = std::env::temp_dir().join(format!("nowplaying-frame-{}.png", std::process::id()));
        let driver = ImageFileDriver::new([8, 16], path.clone());
        let orientation = Orientation {
            landscape: true,
            rotate_180: false,
        };
        let mut controller = DisplayController::new(driver, orientation).unwrap();

        let mut frame = GrayImage::from_pixel(16, 8, Luma([255]));
        frame.put_pixel(0, 0, Luma([0]));
        controller.display(&frame, RefreshMode::Full).unwrap();
        assert_eq!(controller.driver().frames(), 1);
        drop(controller);

        let written = image::open(&path).unwrap().into_luma8();
        std::fs::remove_file(&path).ok();

        assert_eq!(written.dimensions(), (8, 16));
        assert_eq!(written.get_pixel(0, 15).0[0], 0);
        assert_eq!(written.pixels().filter(|p| p.0[0] == 0).count(), 1);
    }
}
