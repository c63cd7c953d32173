//! Image decoding error types

use thiserror::Error;

/// Image decoding errors
#[derive(Error, Debug)]
pub enum ImageError {
    /// No registered decoder recognized the data
    #[error("Unrecognized image format")]
    UnknownFormat,

    /// The data matched a format but was malformed
    #[error("Corrupt image data: {0}")]
    Corrupt(String),

    /// The format was recognized but a feature of it is not handled
    #[error("Unsupported image feature: {0}")]
    Unsupported(String),

    /// Image dimensions exceed what the renderer can upload
    #[error("Image dimensions {width}x{height} exceed the supported maximum")]
    TooLarge { width: u32, height: u32 },
}

/// Result type for image operations
pub type Result<T> = std::result::Result<T, ImageError>;
