use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{artwork, artwork_image},
    errors::ServiceError,
    services::catalog::{ArtworkChanges, NewArtwork},
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateArtworkRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[validate(range(min = 0, message = "Inventory cannot be negative"))]
    pub inventory_count: i32,
    #[serde(default)]
    pub is_published: bool,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateArtworkRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub inventory_count: Option<i32>,
    pub medium: Option<Option<String>>,
    pub dimensions: Option<Option<String>>,
    pub year: Option<Option<i32>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub is_published: bool,
}

/// List published artworks
#[utoipa::path(
    get,
    path = "/api/v1/artworks",
    summary = "List artworks",
    description = "Published artworks for the storefront, newest first",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Artworks retrieved", body = ApiResponse<PaginatedResponse<artwork::Model>>),
    )
)]
pub async fn list_artworks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<artwork::Model>> {
    let (items, total) = state
        .services
        .catalog
        .list_published(query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}

/// Get a published artwork by slug
#[utoipa::path(
    get,
    path = "/api/v1/artworks/{slug}",
    summary = "Get artwork",
    params(("slug" = String, Path, description = "Artwork slug")),
    responses(
        (status = 200, description = "Artwork retrieved", body = ApiResponse<artwork::Model>),
        (status = 404, description = "Unknown or unpublished slug", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_artwork_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<artwork::Model> {
    let found = state.services.catalog.get_published_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(found)))
}

/// Images for a published artwork
pub async fn list_artwork_images(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<artwork_image::Model>> {
    let found = state.services.catalog.get_published_by_slug(&slug).await?;
    let images = state.services.catalog.list_images(found.id).await?;
    Ok(Json(ApiResponse::success(images)))
}

// ---- Admin surface (gated upstream of this service) ----

pub async fn admin_list_artworks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<artwork::Model>> {
    let (items, total) = state
        .services
        .catalog
        .list_all(query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}

pub async fn admin_get_artwork(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<artwork::Model> {
    Ok(Json(ApiResponse::success(
        state.services.catalog.get_artwork(id).await?,
    )))
}

/// Create an artwork
#[utoipa::path(
    post,
    path = "/api/v1/admin/artworks",
    summary = "Create artwork",
    request_body = CreateArtworkRequest,
    responses(
        (status = 201, description = "Artwork created", body = ApiResponse<artwork::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_artwork(
    State(state): State<AppState>,
    Json(request): Json<CreateArtworkRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    if request.price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Price cannot be negative".to_string(),
        ));
    }

    let created = state
        .services
        .catalog
        .create_artwork(NewArtwork {
            title: request.title,
            slug: request.slug,
            description: request.description,
            price: request.price,
            inventory_count: request.inventory_count,
            is_published: request.is_published,
            medium: request.medium,
            dimensions: request.dimensions,
            year: request.year,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn update_artwork(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateArtworkRequest>,
) -> ApiResult<artwork::Model> {
    let updated = state
        .services
        .catalog
        .update_artwork(
            id,
            ArtworkChanges {
                title: request.title,
                slug: request.slug,
                description: request.description,
                price: request.price,
                inventory_count: request.inventory_count,
                medium: request.medium,
                dimensions: request.dimensions,
                year: request.year,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn publish_artwork(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PublishRequest>,
) -> ApiResult<artwork::Model> {
    let updated = state
        .services
        .catalog
        .set_published(id, request.is_published)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_artwork(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.catalog.delete_artwork(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
