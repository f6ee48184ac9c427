//! Content types of stored images.

use image::ImageFormat;

/// MIME type for an image format.
pub fn content_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Guess the MIME type from the leading bytes. `None` if not an image.
pub fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(content_type)
}
