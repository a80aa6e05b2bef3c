use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::exhibition,
    errors::ServiceError,
    services::exhibitions::{ExhibitionChanges, NewExhibition},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateExhibitionRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateExhibitionRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub venue: Option<Option<String>>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
    pub is_published: Option<bool>,
}

/// Published exhibitions for the marketing pages
pub async fn list_exhibitions(State(state): State<AppState>) -> ApiResult<Vec<exhibition::Model>> {
    Ok(Json(ApiResponse::success(
        state.services.exhibitions.list_published().await?,
    )))
}

pub async fn admin_list_exhibitions(
    State(state): State<AppState>,
) -> ApiResult<Vec<exhibition::Model>> {
    Ok(Json(ApiResponse::success(
        state.services.exhibitions.list_all().await?,
    )))
}

pub async fn create_exhibition(
    State(state): State<AppState>,
    Json(request): Json<CreateExhibitionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<exhibition::Model>>), ServiceError> {
    request.validate()?;
    let created = state
        .services
        .exhibitions
        .create_exhibition(NewExhibition {
            title: request.title,
            slug: request.slug,
            description: request.description,
            venue: request.venue,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            is_published: request.is_published,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn update_exhibition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExhibitionRequest>,
) -> ApiResult<exhibition::Model> {
    let updated = state
        .services
        .exhibitions
        .update_exhibition(
            id,
            ExhibitionChanges {
                title: request.title,
                slug: request.slug,
                description: request.description,
                venue: request.venue,
                starts_at: request.starts_at,
                ends_at: request.ends_at,
                is_published: request.is_published,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_exhibition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.exhibitions.delete_exhibition(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
