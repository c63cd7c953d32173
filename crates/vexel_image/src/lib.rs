//! Vexel Image
//!
//! Bitmap decoder interface for the Vexel rendering stack.
//!
//! This crate defines how the renderer talks to image codecs without
//! containing any codec itself:
//!
//! - [`ImageDecoder`]: sniff / header-info / decode, one implementation per
//!   format, provided by the application
//! - [`DecoderRegistry`]: ordered format sniffing across registered codecs
//! - [`DecoderConfig`]: per-call decode options (vertical flip, alpha
//!   unpremultiply); there is deliberately no global configuration
//!
//! Decoded output is always RGBA8, which is what the renderer uploads.

mod decoder;
mod error;
mod registry;

pub use decoder::{DecodedImage, DecoderConfig, ImageDecoder, ImageInfo};
pub use error::{ImageError, Result};
pub use registry::DecoderRegistry;
