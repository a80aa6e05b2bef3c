use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::artwork_image,
    errors::ServiceError,
    services::catalog::NewArtworkImage,
    services::media::ImageVariantSet,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadQuery {
    /// Original filename as sent by the browser; sanitized before use.
    pub filename: String,
    pub alt_text: Option<String>,
}

/// Upload an artwork image
#[utoipa::path(
    post,
    path = "/api/v1/admin/artworks/{id}/images",
    summary = "Upload artwork image",
    description = "Accepts raw image bytes, generates thumbnail/preview/large JPEG \
                   variants, writes them under the media root, and records the \
                   filenames against the artwork.",
    params(
        ("id" = Uuid, Path, description = "Artwork ID"),
        ("filename" = String, Query, description = "Original filename"),
        ("alt_text" = Option<String>, Query, description = "Alt text for the image"),
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "Raw image bytes"),
    responses(
        (status = 201, description = "Image stored", body = ApiResponse<artwork_image::Model>),
        (status = 400, description = "Not a processable image", body = crate::errors::ErrorResponse),
        (status = 404, description = "Artwork not found", body = crate::errors::ErrorResponse),
    )
)]
#[instrument(skip(state, body), fields(artwork_id = %id, body_len = body.len()))]
pub async fn upload_artwork_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<artwork_image::Model>>), ServiceError> {
    // Check the artwork before doing any work so a bad id can't leave
    // orphaned files under the media root.
    state.services.catalog.get_artwork(id).await?;

    // Decode and resize off the async runtime; Lanczos on a large upload
    // can take hundreds of milliseconds.
    let media = state.services.media.clone();
    let filename = query.filename.clone();
    let variants = tokio::task::spawn_blocking(move || media.generate_variants(&body, &filename))
        .await
        .map_err(|err| ServiceError::InternalError(err.to_string()))??;

    persist_variants(&state, &variants).await?;

    let record = state
        .services
        .catalog
        .add_image(NewArtworkImage {
            artwork_id: id,
            thumbnail_filename: variants.thumbnail.filename.clone(),
            preview_filename: variants.preview.filename.clone(),
            large_filename: variants.large.filename.clone(),
            alt_text: query.alt_text,
        })
        .await?;

    info!(image_id = %record.id, "artwork image stored");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))))
}

async fn persist_variants(
    state: &AppState,
    variants: &ImageVariantSet,
) -> Result<(), ServiceError> {
    let root = std::path::Path::new(&state.config.media_root);
    tokio::fs::create_dir_all(root)
        .await
        .map_err(|err| ServiceError::InternalError(format!("media root unavailable: {err}")))?;

    for variant in variants.iter() {
        tokio::fs::write(root.join(&variant.filename), &variant.data)
            .await
            .map_err(|err| {
                ServiceError::InternalError(format!(
                    "failed to write {}: {err}",
                    variant.filename
                ))
            })?;
    }
    Ok(())
}
