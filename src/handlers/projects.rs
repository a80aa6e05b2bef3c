use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::project,
    errors::ServiceError,
    services::projects::{NewProject, ProjectChanges},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub url: Option<Option<String>>,
    pub is_published: Option<bool>,
    pub position: Option<i32>,
}

/// Published projects for the marketing pages
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Vec<project::Model>> {
    Ok(Json(ApiResponse::success(
        state.services.projects.list_published().await?,
    )))
}

pub async fn admin_list_projects(State(state): State<AppState>) -> ApiResult<Vec<project::Model>> {
    Ok(Json(ApiResponse::success(
        state.services.projects.list_all().await?,
    )))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ApiResponse<project::Model>>), ServiceError> {
    request.validate()?;
    let created = state
        .services
        .projects
        .create_project(NewProject {
            title: request.title,
            slug: request.slug,
            description: request.description,
            url: request.url,
            is_published: request.is_published,
            position: request.position,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<project::Model> {
    let updated = state
        .services
        .projects
        .update_project(
            id,
            ProjectChanges {
                title: request.title,
                slug: request.slug,
                description: request.description,
                url: request.url,
                is_published: request.is_published,
                position: request.position,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.projects.delete_project(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
