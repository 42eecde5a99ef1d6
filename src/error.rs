//! Error type shared by the bus, the compositor and the viewer.

use thiserror::Error;

/// Errors surfaced by viewer operations.
///
/// Handler failures inside [`EventBus::publish`](crate::core::event_bus::EventBus::publish)
/// never show up here: those are logged and swallowed per subscriber.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Operation on a channel that was never enabled.
    #[error("No callback channel named '{0}'")]
    UnknownChannel(String),

    /// Non-positive or non-finite scale. State is left untouched.
    #[error("Invalid scale ({sx}, {sy}): both factors must be finite and > 0")]
    InvalidScale { sx: f64, sy: f64 },

    /// Non-finite cut levels. Ordering is deliberately not checked.
    #[error("Invalid cut levels ({low}, {high}): both must be finite")]
    InvalidCutLevels { low: f64, high: f64 },

    /// Non-finite pan position.
    #[error("Invalid pan position ({x}, {y})")]
    InvalidPan { x: f64, y: f64 },

    /// Surface operation before a window size was configured.
    #[error("No surface defined (window size not configured)")]
    NoSurface,

    /// Source array does not match the surface extent.
    #[error("Array shape mismatch: surface is {expected:?}, array is {actual:?}")]
    ArrayShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Source buffer length disagrees with its declared dimensions.
    #[error("Array length {len} does not match {width}x{height}x{channels}")]
    ArrayLength {
        len: usize,
        width: usize,
        height: usize,
        channels: usize,
    },

    #[error("Unknown cursor type '{0}'")]
    UnknownCursor(String),

    #[error("Invalid channel order '{0}'")]
    InvalidChannelOrder(String),

    #[error("Unsupported output format '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The image source could not produce a window array.
    #[error("Image source failed: {0}")]
    Source(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
