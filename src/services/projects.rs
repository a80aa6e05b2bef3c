use crate::{
    entities::{project, Project},
    errors::ServiceError,
    services::catalog::slugify,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub url: Option<String>,
    pub is_published: bool,
    pub position: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub url: Option<Option<String>>,
    pub is_published: Option<bool>,
    pub position: Option<i32>,
}

/// CRUD for the portfolio projects shown on the marketing pages.
#[derive(Clone)]
pub struct ProjectService {
    db: Arc<DatabaseConnection>,
}

impl ProjectService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list_published(&self) -> Result<Vec<project::Model>, ServiceError> {
        Ok(Project::find()
            .filter(project::Column::IsPublished.eq(true))
            .order_by_asc(project::Column::Position)
            .all(&*self.db)
            .await?)
    }

    pub async fn list_all(&self) -> Result<Vec<project::Model>, ServiceError> {
        Ok(Project::find()
            .order_by_asc(project::Column::Position)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_project(&self, id: Uuid) -> Result<project::Model, ServiceError> {
        Project::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Project with ID {id} not found")))
    }

    pub async fn create_project(
        &self,
        new_project: NewProject,
    ) -> Result<project::Model, ServiceError> {
        let slug = new_project
            .slug
            .unwrap_or_else(|| slugify(&new_project.title));
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Project slug cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(project::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new_project.title),
            slug: Set(slug),
            description: Set(new_project.description),
            url: Set(new_project.url),
            is_published: Set(new_project.is_published),
            position: Set(new_project.position),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?)
    }

    pub async fn update_project(
        &self,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<project::Model, ServiceError> {
        let existing = self.get_project(id).await?;
        let mut active: project::ActiveModel = existing.into();

        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(slug) = changes.slug {
            if slug.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Project slug cannot be empty".to_string(),
                ));
            }
            active.slug = Set(slug);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(url) = changes.url {
            active.url = Set(url);
        }
        if let Some(is_published) = changes.is_published {
            active.is_published = Set(is_published);
        }
        if let Some(position) = changes.position {
            active.position = Set(position);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_project(id).await?;
        existing.delete(&*self.db).await?;
        Ok(())
    }
}
