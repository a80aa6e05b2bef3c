use crate::{
    entities::{artwork, artwork_image, Artwork, ArtworkImage},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewArtwork {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub inventory_count: i32,
    pub is_published: bool,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub year: Option<i32>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ArtworkChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub inventory_count: Option<i32>,
    pub medium: Option<Option<String>>,
    pub dimensions: Option<Option<String>>,
    pub year: Option<Option<i32>>,
}

/// The variant filenames persisted for an uploaded artwork image.
#[derive(Debug, Clone)]
pub struct NewArtworkImage {
    pub artwork_id: Uuid,
    pub thumbnail_filename: String,
    pub preview_filename: String,
    pub large_filename: String,
    pub alt_text: Option<String>,
}

/// Catalog CRUD for the artwork gallery, plus image metadata rows.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Published works for the storefront, newest first.
    pub async fn list_published(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<artwork::Model>, u64), ServiceError> {
        let paginator = Artwork::find()
            .filter(artwork::Column::IsPublished.eq(true))
            .order_by_desc(artwork::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let artworks = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((artworks, total))
    }

    /// Full catalog for the back office, unpublished included.
    pub async fn list_all(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<artwork::Model>, u64), ServiceError> {
        let paginator = Artwork::find()
            .order_by_desc(artwork::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let artworks = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((artworks, total))
    }

    pub async fn get_artwork(&self, id: Uuid) -> Result<artwork::Model, ServiceError> {
        Artwork::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Artwork with ID {id} not found")))
    }

    /// Storefront lookup: published works only.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<artwork::Model, ServiceError> {
        Artwork::find()
            .filter(artwork::Column::Slug.eq(slug))
            .filter(artwork::Column::IsPublished.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Artwork \"{slug}\" not found")))
    }

    #[instrument(skip(self, new_artwork), fields(title = %new_artwork.title))]
    pub async fn create_artwork(
        &self,
        new_artwork: NewArtwork,
    ) -> Result<artwork::Model, ServiceError> {
        let slug = match new_artwork.slug {
            Some(slug) => slug,
            None => slugify(&new_artwork.title),
        };
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Artwork slug cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let created = artwork::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new_artwork.title),
            slug: Set(slug),
            description: Set(new_artwork.description),
            price: Set(new_artwork.price),
            inventory_count: Set(new_artwork.inventory_count),
            is_published: Set(new_artwork.is_published),
            medium: Set(new_artwork.medium),
            dimensions: Set(new_artwork.dimensions),
            year: Set(new_artwork.year),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ArtworkCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_artwork(
        &self,
        id: Uuid,
        changes: ArtworkChanges,
    ) -> Result<artwork::Model, ServiceError> {
        let existing = self.get_artwork(id).await?;
        let mut active: artwork::ActiveModel = existing.into();

        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(slug) = changes.slug {
            if slug.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Artwork slug cannot be empty".to_string(),
                ));
            }
            active.slug = Set(slug);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(price) = changes.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price cannot be negative".to_string(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(inventory_count) = changes.inventory_count {
            if inventory_count < 0 {
                return Err(ServiceError::ValidationError(
                    "Inventory count cannot be negative".to_string(),
                ));
            }
            active.inventory_count = Set(inventory_count);
        }
        if let Some(medium) = changes.medium {
            active.medium = Set(medium);
        }
        if let Some(dimensions) = changes.dimensions {
            active.dimensions = Set(dimensions);
        }
        if let Some(year) = changes.year {
            active.year = Set(year);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ArtworkUpdated(id))
            .await;
        Ok(updated)
    }

    pub async fn set_published(
        &self,
        id: Uuid,
        is_published: bool,
    ) -> Result<artwork::Model, ServiceError> {
        let existing = self.get_artwork(id).await?;
        let mut active: artwork::ActiveModel = existing.into();
        active.is_published = Set(is_published);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ArtworkUpdated(id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_artwork(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_artwork(id).await?;
        existing.delete(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ArtworkDeleted(id))
            .await;
        Ok(())
    }

    /// Records the variant filenames for an uploaded image. The first image
    /// of an artwork becomes its primary image.
    pub async fn add_image(
        &self,
        new_image: NewArtworkImage,
    ) -> Result<artwork_image::Model, ServiceError> {
        // Ensure the artwork exists so orphan image rows can't appear.
        self.get_artwork(new_image.artwork_id).await?;

        let existing_count = ArtworkImage::find()
            .filter(artwork_image::Column::ArtworkId.eq(new_image.artwork_id))
            .count(&*self.db)
            .await?;

        let created = artwork_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            artwork_id: Set(new_image.artwork_id),
            thumbnail_filename: Set(new_image.thumbnail_filename),
            preview_filename: Set(new_image.preview_filename),
            large_filename: Set(new_image.large_filename),
            alt_text: Set(new_image.alt_text),
            position: Set(existing_count as i32),
            is_primary: Set(existing_count == 0),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        Ok(created)
    }

    pub async fn list_images(
        &self,
        artwork_id: Uuid,
    ) -> Result<Vec<artwork_image::Model>, ServiceError> {
        Ok(ArtworkImage::find()
            .filter(artwork_image::Column::ArtworkId.eq(artwork_id))
            .order_by_asc(artwork_image::Column::Position)
            .all(&*self.db)
            .await?)
    }
}

/// Lowercase ASCII slug from a title: alphanumerics kept, runs of anything
/// else become single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut prev_hyphen = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Harbor at Dusk"), "harbor-at-dusk");
        assert_eq!(slugify("Untitled #4 (2023)"), "untitled-4-2023");
        assert_eq!(slugify("  spaced  out  "), "spaced-out");
        assert_eq!(slugify("日本語"), "");
    }
}
