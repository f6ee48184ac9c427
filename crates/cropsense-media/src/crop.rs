//! Rectangular crop of a stored image.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;

use cropsense_models::{CropRegion, PixelRect, RegionFields, RegionPolicy};
use cropsense_storage::write_atomic;
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, instrument};

use crate::error::{MediaError, MediaResult};

/// A decoded image together with the format it was stored in.
pub struct SourceImage {
    image: DynamicImage,
    format: ImageFormat,
}

impl SourceImage {
    /// Decode the image at `path`, detecting the format from its contents.
    pub fn open(path: &Path) -> MediaResult<Self> {
        let reader = ImageReader::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MediaError::FileNotFound(path.to_path_buf()),
            _ => MediaError::Io(e),
        })?;
        let reader = reader.with_guessed_format()?;

        let format = reader
            .format()
            .ok_or_else(|| MediaError::unreadable("unrecognized image format"))?;
        let image = reader
            .decode()
            .map_err(|e| MediaError::unreadable(e.to_string()))?;

        Ok(Self { image, format })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Copy out `rect`. Output pixel `(x, y)` is source pixel `(rect.x + x, rect.y + y)`.
    pub fn extract(&self, rect: PixelRect) -> DynamicImage {
        self.image.crop_imm(rect.x, rect.y, rect.width, rect.height)
    }
}

/// A cropped image encoded in memory, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct RenderedCrop {
    /// Region as parsed from the request, before the policy was applied
    pub region: CropRegion,
    pub rect: PixelRect,
    pub source_width: u32,
    pub source_height: u32,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

/// Result of a successful crop.
#[derive(Debug, Clone)]
pub struct CropOutcome {
    /// Region as parsed from the request, before the policy was applied
    pub region: CropRegion,
    pub rect: PixelRect,
    pub source_width: u32,
    pub source_height: u32,
    pub format: ImageFormat,
    pub output_path: PathBuf,
    pub output_bytes: u64,
}

/// Encode `image` in memory.
pub fn encode(image: &DynamicImage, format: ImageFormat) -> MediaResult<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), format)
        .map_err(|e| MediaError::encode_failed(e.to_string()))?;
    Ok(buffer)
}

/// Decode `source`, resolve the region against it and encode the crop in
/// the source format.
///
/// The source is decoded first because absent region fields default to its
/// dimensions. CPU-bound; call from a blocking context.
#[instrument(skip_all, fields(source = %source.display(), policy = %policy))]
pub fn render_crop(
    source: &Path,
    fields: &RegionFields,
    policy: RegionPolicy,
) -> MediaResult<RenderedCrop> {
    let image = SourceImage::open(source)?;
    let (width, height) = (image.width(), image.height());

    let region = fields.parse(width, height)?;
    let rect = policy.apply(region, width, height)?;
    debug!(%region, ?rect, width, height, "Resolved crop region");

    let bytes = encode(&image.extract(rect), image.format())?;

    Ok(RenderedCrop {
        region,
        rect,
        source_width: width,
        source_height: height,
        format: image.format(),
        bytes,
    })
}

/// Crop `source` into `dest`.
///
/// Decoding and encoding run on the blocking thread pool. `dest` appears
/// only once fully written, and nothing is written on any error.
pub async fn crop_image(
    source: PathBuf,
    dest: PathBuf,
    fields: RegionFields,
    policy: RegionPolicy,
) -> MediaResult<CropOutcome> {
    let start = Instant::now();

    let rendered = tokio::task::spawn_blocking(move || render_crop(&source, &fields, policy))
        .await
        .map_err(|e| MediaError::internal(format!("crop task failed: {e}")))??;

    write_atomic(&dest, &rendered.bytes).await?;

    info!(
        dest = %dest.display(),
        crop_width = rendered.rect.width,
        crop_height = rendered.rect.height,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Cropped image"
    );

    Ok(CropOutcome {
        region: rendered.region,
        rect: rendered.rect,
        source_width: rendered.source_width,
        source_height: rendered.source_height,
        format: rendered.format,
        output_path: dest,
        output_bytes: rendered.bytes.len() as u64,
    })
}
