/// Orientation, buffer packing and the shutdown guard.
pub mod controller;
/// The command set a panel driver implements.
pub mod driver;
/// PNG-writing stand-in for the panel.
pub mod image_file;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{DisplayController, Orientation};
pub use driver::{EpdDriver, RefreshMode};
pub use image_file::ImageFileDriver;
