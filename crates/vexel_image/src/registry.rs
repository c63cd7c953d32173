//! Format sniffing across registered decoders

use tracing::debug;

use crate::decoder::{DecodedImage, DecoderConfig, ImageDecoder, ImageInfo};
use crate::error::{ImageError, Result};

/// An ordered collection of decoders.
///
/// Lookup walks the registration order and picks the first decoder whose
/// `sniff` accepts the data, so more specific formats should be registered
/// before permissive ones.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn ImageDecoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, decoder: Box<dyn ImageDecoder>) {
        debug!(format = decoder.name(), "registered image decoder");
        self.decoders.push(decoder);
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// The first registered decoder that recognizes `data`, if any
    pub fn find(&self, data: &[u8]) -> Option<&dyn ImageDecoder> {
        self.decoders
            .iter()
            .map(|d| d.as_ref())
            .find(|d| d.sniff(data))
    }

    /// Header info via the first matching decoder
    pub fn info(&self, data: &[u8]) -> Result<ImageInfo> {
        self.find(data).ok_or(ImageError::UnknownFormat)?.info(data)
    }

    /// Full decode via the first matching decoder
    pub fn decode(&self, data: &[u8], config: &DecoderConfig) -> Result<DecodedImage> {
        self.find(data)
            .ok_or(ImageError::UnknownFormat)?
            .decode(data, config)
    }
}
