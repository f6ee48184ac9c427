//! Upload receiver: pulls the `file` part and region fields out of a
//! multipart form.

use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::StatusCode;
use cropsense_models::RegionFields;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Form field carrying the image.
pub const FILE_FIELD: &str = "file";

/// A received, not yet persisted upload.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    /// Filename declared by the client; never used as a path
    pub filename: String,
    pub bytes: Bytes,
    pub region: RegionFields,
}

/// Read the whole form.
///
/// Only the first `file` part that declares a filename is kept. A `file`
/// part without a filename is a plain text field and does not count. Region
/// fields may appear before or after the file. Nothing is persisted here, so
/// a rejected request leaves no trace on disk.
pub async fn receive(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<ReceivedUpload> {
    // Not multipart at all: there is no file part
    let mut multipart = multipart.map_err(|_| ApiError::MissingFilePart)?;

    let mut file: Option<(String, Bytes)> = None;
    let mut region = RegionFields::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            let Some(filename) = field.file_name().map(str::to_string) else {
                continue;
            };
            if file.is_some() {
                continue;
            }
            let bytes = field.bytes().await.map_err(multipart_error)?;
            debug!(filename = %filename, size_bytes = bytes.len(), "Received file part");
            file = Some((filename, bytes));
        } else if field.file_name().is_none() && is_region_field(&name) {
            // Not-UTF-8 text is kept lossily and fails integer parsing later,
            // like any other malformed coordinate
            let raw = field.bytes().await.map_err(multipart_error)?;
            region.set(&name, String::from_utf8_lossy(&raw).into_owned());
        }
    }

    let (filename, bytes) = file.ok_or(ApiError::MissingFilePart)?;
    if filename.is_empty() {
        return Err(ApiError::EmptyFilename);
    }

    Ok(ReceivedUpload {
        filename,
        bytes,
        region,
    })
}

fn is_region_field(name: &str) -> bool {
    cropsense_models::REGION_FIELD_NAMES.contains(&name)
}

fn multipart_error(e: MultipartError) -> ApiError {
    match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(e.body_text()),
        status => ApiError::Multipart {
            status,
            message: e.body_text(),
        },
    }
}
