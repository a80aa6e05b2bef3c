use crate::{
    entities::{exhibition, Exhibition},
    errors::ServiceError,
    services::catalog::slugify,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewExhibition {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ExhibitionChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub venue: Option<Option<String>>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
    pub is_published: Option<bool>,
}

/// CRUD for exhibition announcements.
#[derive(Clone)]
pub struct ExhibitionService {
    db: Arc<DatabaseConnection>,
}

impl ExhibitionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Published exhibitions, upcoming/most recent first.
    pub async fn list_published(&self) -> Result<Vec<exhibition::Model>, ServiceError> {
        Ok(Exhibition::find()
            .filter(exhibition::Column::IsPublished.eq(true))
            .order_by_desc(exhibition::Column::StartsAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn list_all(&self) -> Result<Vec<exhibition::Model>, ServiceError> {
        Ok(Exhibition::find()
            .order_by_desc(exhibition::Column::StartsAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_exhibition(&self, id: Uuid) -> Result<exhibition::Model, ServiceError> {
        Exhibition::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Exhibition with ID {id} not found")))
    }

    pub async fn create_exhibition(
        &self,
        new_exhibition: NewExhibition,
    ) -> Result<exhibition::Model, ServiceError> {
        let slug = new_exhibition
            .slug
            .unwrap_or_else(|| slugify(&new_exhibition.title));
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Exhibition slug cannot be empty".to_string(),
            ));
        }
        if let (Some(starts_at), Some(ends_at)) =
            (new_exhibition.starts_at, new_exhibition.ends_at)
        {
            if ends_at < starts_at {
                return Err(ServiceError::ValidationError(
                    "Exhibition cannot end before it starts".to_string(),
                ));
            }
        }

        let now = Utc::now();
        Ok(exhibition::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new_exhibition.title),
            slug: Set(slug),
            description: Set(new_exhibition.description),
            venue: Set(new_exhibition.venue),
            starts_at: Set(new_exhibition.starts_at),
            ends_at: Set(new_exhibition.ends_at),
            is_published: Set(new_exhibition.is_published),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?)
    }

    pub async fn update_exhibition(
        &self,
        id: Uuid,
        changes: ExhibitionChanges,
    ) -> Result<exhibition::Model, ServiceError> {
        let existing = self.get_exhibition(id).await?;
        let mut active: exhibition::ActiveModel = existing.into();

        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(slug) = changes.slug {
            if slug.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Exhibition slug cannot be empty".to_string(),
                ));
            }
            active.slug = Set(slug);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(venue) = changes.venue {
            active.venue = Set(venue);
        }
        if let Some(starts_at) = changes.starts_at {
            active.starts_at = Set(starts_at);
        }
        if let Some(ends_at) = changes.ends_at {
            active.ends_at = Set(ends_at);
        }
        if let Some(is_published) = changes.is_published {
            active.is_published = Set(is_published);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    pub async fn delete_exhibition(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_exhibition(id).await?;
        existing.delete(&*self.db).await?;
        Ok(())
    }
}
