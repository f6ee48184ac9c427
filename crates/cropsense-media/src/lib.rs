//! Crop transform for uploaded images.
//!
//! This crate provides:
//! - Decoding with format detection from file contents
//! - Applying a `RegionPolicy` and extracting the rectangle
//! - Encoding the derivative in the source format and writing it atomically

pub mod crop;
pub mod error;
pub mod format;

pub use crop::{crop_image, encode, render_crop, CropOutcome, RenderedCrop, SourceImage};
pub use error::{MediaError, MediaResult};
pub use format::{content_type, sniff_content_type};
pub use image::ImageFormat;
