//! Store-then-crop pipeline shared by `/crop` and `/disease-diagnosis`.

use std::time::Instant;

use cropsense_media::{crop_image, CropOutcome};
use cropsense_storage::{StorageKey, StoredUpload};
use tracing::{info, instrument};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use crate::upload::ReceivedUpload;

/// A persisted upload and its derivative.
#[derive(Debug, Clone)]
pub struct CropResult {
    pub upload: StoredUpload,
    pub derived_key: StorageKey,
    /// URL path the derivative is served at
    pub derived_url: String,
    pub outcome: CropOutcome,
}

/// Persist the upload verbatim, then crop it into `cropped_<key>`.
///
/// The original stays on disk even when cropping fails.
#[instrument(skip_all, fields(filename = %upload.filename, size_bytes = upload.bytes.len()))]
pub async fn store_and_crop(state: &AppState, upload: ReceivedUpload) -> ApiResult<CropResult> {
    let start = Instant::now();

    let stored = state
        .storage
        .persist(&upload.filename, &upload.bytes)
        .await?;
    metrics::record_upload_bytes(stored.size_bytes);

    let derived_key = stored.key.derived();
    let dest = state.storage.resolve(&derived_key);

    let result = crop_image(
        stored.path.clone(),
        dest,
        upload.region,
        state.config.region_policy,
    )
    .await
    .map_err(ApiError::from);

    let outcome_label = match &result {
        Ok(_) => "ok",
        Err(e) => e.code(),
    };
    metrics::record_crop(outcome_label, start.elapsed().as_secs_f64());

    let outcome = result?;
    info!(
        key = %stored.key,
        width = outcome.rect.width,
        height = outcome.rect.height,
        source_width = outcome.source_width,
        source_height = outcome.source_height,
        "Crop complete"
    );

    Ok(CropResult {
        derived_url: state.storage.public_url(&derived_key),
        upload: stored,
        derived_key,
        outcome,
    })
}
