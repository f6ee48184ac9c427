//! Landing page and the crop endpoint.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Html;

use crate::error::ApiResult;
use crate::pipeline::store_and_crop;
use crate::render;
use crate::state::AppState;
use crate::upload::receive;

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(render::LANDING_PAGE)
}

/// `POST /crop`
pub async fn crop(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Html<String>> {
    let upload = receive(multipart).await?;
    let result = store_and_crop(&state, upload).await?;

    Ok(Html(render::crop_success(
        &result.upload.original_filename,
        &result.derived_url,
    )))
}
