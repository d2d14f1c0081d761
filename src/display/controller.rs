use image::{GrayImage, imageops};

use crate::error::HardwareError;

use super::driver::{EpdDriver, RefreshMode, buffer_len, line_width};

/// How the canvas is mounted relative to the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Orientation {
    /// Canvas is wider than tall; width and height of the panel swap.
    pub landscape: bool,
    /// Turn the frame upside down before sending it.
    pub rotate_180: bool,
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            landscape: true,
            rotate_180: true,
        }
    }
}

/// Owns the panel driver for the lifetime of the program.
///
/// Dropping the controller puts the panel to sleep and releases the driver,
/// unless [`DisplayController::close`] already did. Whatever ends the
/// refresh loop, the panel is never left powered mid-waveform.
pub struct DisplayController<D: EpdDriver> {
    driver: D,
    orientation: Orientation,
    closed: bool,
}

impl<D: EpdDriver> DisplayController<D> {
    /// Takes ownership of `driver` and initializes the panel.
    ///
    /// If initialization fails the driver is still put to sleep and
    /// released on the way out.
    pub fn new(driver: D, orientation: Orientation) -> Result<Self, HardwareError> {
        let mut controller = Self {
            driver,
            orientation,
            closed: false,
        };

        log::info!(
            "Initialized display controller. Display dimensions: {}x{}",
            controller.width(),
            controller.height()
        );
        controller.init()?;
        Ok(controller)
    }

    /// Canvas width in the configured orientation.
    pub fn width(&self) -> u32 {
        let [width, height] = self.driver.native_size();
        if self.orientation.landscape { height } else { width }
    }

    /// Canvas height in the configured orientation.
    pub fn height(&self) -> u32 {
        let [width, height] = self.driver.native_size();
        if self.orientation.landscape { width } else { height }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn init(&mut self) -> Result<(), HardwareError> {
        log::info!("Initializing display registers.");
        self.driver.init()
    }

    pub fn reset(&mut self) -> Result<(), HardwareError> {
        log::info!("Performing hardware reset.");
        self.driver.reset()
    }

    /// Wakes the panel and blanks it to white.
    pub fn clear(&mut self) -> Result<(), HardwareError> {
        log::info!("Clearing display.");
        self.init()?;
        self.driver.clear(0xFF)
    }

    pub fn sleep(&mut self) -> Result<(), HardwareError> {
        log::info!("Going to sleep...");
        self.driver.sleep()
    }

    /// Packs `frame` into the panel's native buffer layout.
    ///
    /// `frame` must match the panel size in either orientation; a landscape
    /// frame is turned onto the portrait panel column by column.
    pub fn frame_buffer(&self, frame: &GrayImage) -> Result<Vec<u8>, HardwareError> {
        let native = self.driver.native_size();
        let [native_width, native_height] = native;

        let rotated;
        let frame = if self.orientation.rotate_180 {
            rotated = imageops::rotate180(frame);
            &rotated
        } else {
            frame
        };

        let stride = line_width(native_width);
        let mut buffer = vec![0xFF; buffer_len(native)];
        let mut set_black = |x: u32, y: u32| {
            buffer[(x / 8) as usize + y as usize * stride] &= !(0x80 >> (x % 8));
        };

        let (width, height) = frame.dimensions();
        if (width, height) == (native_width, native_height) {
            for (x, y, pixel) in frame.enumerate_pixels() {
                if pixel.0[0] < 128 {
                    set_black(x, y);
                }
            }
        } else if (width, height) == (native_height, native_width) {
            for (x, y, pixel) in frame.enumerate_pixels() {
                if pixel.0[0] < 128 {
                    set_black(y, native_height - x - 1);
                }
            }
        } else {
            return Err(HardwareError::FrameSize {
                expected: native,
                actual: [width, height],
            });
        }

        Ok(buffer)
    }

    /// Sends `frame` to the panel with the given refresh waveform.
    pub fn display(&mut self, frame: &GrayImage, mode: RefreshMode) -> Result<(), HardwareError> {
        let buffer = self.frame_buffer(frame)?;
        log::debug!("Pushing {} byte frame with {mode:?} refresh.", buffer.len());
        self.driver.display(&buffer, mode)
    }

    /// Puts the panel to sleep and releases the driver, reporting failures.
    pub fn close(mut self) -> Result<(), HardwareError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), HardwareError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let slept = self.sleep();
        let released = self.driver.release();
        slept.and(released)
    }
}

impl<D: EpdDriver> Drop for DisplayController<D> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("Display shutdown failed: {e}");
        }
    }
}
