//! The decoder trait and its data types

use crate::error::Result;

/// Options applied to a single decode call.
///
/// These are per-call on purpose: two callers decoding concurrently must not
/// observe each other's settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Flip the image vertically so the first row is the bottom row
    pub flip_vertically: bool,
    /// Convert premultiplied-alpha sources back to straight alpha
    pub unpremultiply_alpha: bool,
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flip_vertically(mut self, flip: bool) -> Self {
        self.flip_vertically = flip;
        self
    }

    pub fn unpremultiply_alpha(mut self, unpremultiply: bool) -> Self {
        self.unpremultiply_alpha = unpremultiply;
        self
    }
}

/// Header-level description of an encoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Channel count of the encoded data (1, 2, 3, or 4); decoded output is
    /// always expanded to RGBA8.
    pub source_channels: u8,
}

/// A decoded bitmap, always 8-bit RGBA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Builds an image from raw RGBA8 bytes, checking the length.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }
}

/// A single image codec.
///
/// Implementations live outside this crate; the renderer only consumes the
/// trait. Decoders must be stateless across calls so they can be shared.
pub trait ImageDecoder: Send + Sync {
    /// Short lowercase format name ("png", "jpeg", ...), used in logs
    fn name(&self) -> &'static str;

    /// Cheap magic-byte test: does this data look like our format?
    fn sniff(&self, data: &[u8]) -> bool;

    /// Parse the header only, without decoding pixels
    fn info(&self, data: &[u8]) -> Result<ImageInfo>;

    /// Decode the full image to RGBA8
    fn decode(&self, data: &[u8], config: &DecoderConfig) -> Result<DecodedImage>;
}
