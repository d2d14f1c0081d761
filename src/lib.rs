//! # nowplaying-epd
//!
//! Shows the track currently playing on Spotify on a small black-and-white
//! e-paper panel.
//!
//! ## Overview
//!
//! Every few seconds the [`NowPlaying`] loop asks a [`NowPlayingSource`] what
//! is playing. When the track changes, the [`NowPlayingScreen`] wraps the
//! title and artist into the space left of the album art, stepping down
//! through smaller title sizes until the text fits, and the resulting frame
//! is packed and pushed to the panel by a [`DisplayController`].
//!
//! Text measurement goes through the [`text::TextMetrics`] trait, so the
//! wrapping and fitting logic runs the same against real fonts
//! ([`text::FontFace`]) and fixed-width metrics.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nowplaying_epd::{
//!     Config, DisplayController, FontStorage, ImageFileDriver, NowPlaying, NowPlayingScreen,
//!     SpotifyClient,
//! };
//!
//! # fn main() -> Result<(), nowplaying_epd::AppError> {
//! let config = Config::load()?;
//! let driver = ImageFileDriver::new(config.display.native_size(), "frame.png".into());
//! let display = DisplayController::new(driver, config.display.orientation())?;
//!
//! let mut storage = FontStorage::new();
//! let size = [display.width(), display.height()];
//! let screen = NowPlayingScreen::load(&mut storage, config.layout.clone(), &config.assets_dir, size)?;
//!
//! let mut app = NowPlaying::new(SpotifyClient::new(config.spotify.clone()), screen, display, config.display.refresh);
//! app.poll_once()?;
//! app.close()?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod artwork;
pub mod config;
pub mod display;
pub mod error;
pub mod font_storage;
pub mod glyph_id;
pub mod renderer;
pub mod screen;
pub mod source;
pub mod spotify;
pub mod text;

// common re-exports
pub use app::{LoopState, NowPlaying, PollOutcome};
pub use config::Config;
pub use display::{DisplayController, EpdDriver, ImageFileDriver, Orientation, RefreshMode};
pub use error::{ApiError, AppError, ArtworkError, ConfigError, FontError, HardwareError};
pub use font_storage::FontStorage;
pub use glyph_id::GlyphId;
pub use screen::{NowPlayingScreen, TrackView};
pub use source::{NowPlayingSource, Track};
pub use spotify::SpotifyClient;

// re-export dependencies
pub use fontdb;
pub use fontdue;
pub use image;
