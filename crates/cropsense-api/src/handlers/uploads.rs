//! Read-only access to stored originals and derivatives.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use cropsense_media::sniff_content_type;
use cropsense_storage::StorageKey;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /uploads/:key`
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    let key = StorageKey::parse(&key).map_err(|_| ApiError::not_found("Upload not found"))?;
    let bytes = state.storage.read(&key).await?;

    // Bytes are stored verbatim, so trust the contents over the extension
    let content_type = sniff_content_type(&bytes).unwrap_or_else(|| key.content_type());

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    )
        .into_response())
}
