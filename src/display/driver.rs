use serde::Deserialize;

use crate::error::HardwareError;

/// Refresh waveforms offered by the panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    /// Full refresh with the flashing clean-up waveform.
    #[default]
    Full,
    /// Shorter full refresh, slightly more ghosting.
    Fast,
    /// Partial update against the stored base image.
    Partial,
    /// Stores the frame as the base image for later partial updates.
    PartialBase,
}

/// Commands understood by an e-paper panel.
///
/// Frame buffers are 1 bit per pixel in the panel's native portrait
/// orientation, MSB first, rows padded to whole bytes, `0` meaning black.
/// [`crate::display::DisplayController`] produces them from a canvas.
pub trait EpdDriver {
    /// Native `[width, height]` in pixels.
    fn native_size(&self) -> [u32; 2];

    /// Loads the panel registers. Needed after power-up and after `sleep`.
    fn init(&mut self) -> Result<(), HardwareError>;

    fn reset(&mut self) -> Result<(), HardwareError>;

    /// Fills the whole panel with one byte pattern (`0xFF` is white).
    fn clear(&mut self, color: u8) -> Result<(), HardwareError>;

    fn display(&mut self, buffer: &[u8], mode: RefreshMode) -> Result<(), HardwareError>;

    /// Puts the controller into deep sleep.
    fn sleep(&mut self) -> Result<(), HardwareError>;

    /// Releases the bus and GPIO lines. The driver is unusable afterwards.
    fn release(&mut self) -> Result<(), HardwareError>;
}

/// Bytes per row of a packed frame for a panel `width` pixels wide.
pub fn line_width(width: u32) -> usize {
    width.div_ceil(8) as usize
}

/// Length of a packed frame for a panel of `native_size`.
pub fn buffer_len(native_size: [u32; 2]) -> usize {
    line_width(native_size[0]) * native_size[1] as usize
}
