//! Error kinds, one per failure class of the refresh loop.
//!
//! The loop decides what to do from the kind alone: [`ApiError`] and
//! [`ArtworkError`] are logged and the cycle is dropped, [`HardwareError`]
//! ends the loop. Text layout has no error type because it cannot fail.

use std::path::PathBuf;

/// Streaming API failures. Always transient from the loop's point of view.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The HTTP request failed, either in transport or with an error status.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// The response body could not be read or decoded.
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ApiError {
    pub(crate) fn request(url: &str, source: ureq::Error) -> Self {
        Self::Request {
            url: url.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn decode(url: &str, reason: impl ToString) -> Self {
        Self::Decode {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Album art could not be downloaded, decoded or placed.
#[derive(thiserror::Error, Debug)]
pub enum ArtworkError {
    #[error("artwork download failed: {0}")]
    Fetch(#[from] ApiError),

    #[error("artwork decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("bitmap {path} could not be opened: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Display hardware failures. These are never retried.
#[derive(thiserror::Error, Debug)]
pub enum HardwareError {
    #[error("frame could not be written: {0}")]
    Image(#[from] image::ImageError),

    /// The canvas does not match the panel in either orientation.
    #[error("frame is {actual:?} but the panel accepts {expected:?} or its transpose")]
    FrameSize { expected: [u32; 2], actual: [u32; 2] },

    #[error("frame buffer holds {actual} bytes, panel expects {expected}")]
    BufferLength { expected: usize, actual: usize },

    #[error("display driver error: {0}")]
    Device(String),
}

/// Font files that could not be turned into usable faces.
#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("no usable font face in {0}")]
    NoFace(PathBuf),

    #[error("font face could not be loaded by the rasterizer: {0}")]
    Rasterizer(String),

    #[error("no font sizes configured for {0}")]
    NoSizes(&'static str),
}

/// Startup configuration problems.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("missing setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Everything that can stop the program.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error("interrupt handler could not be installed: {0}")]
    Signal(#[from] ctrlc::Error),
}
