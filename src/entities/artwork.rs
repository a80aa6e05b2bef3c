use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Artwork entity for the gallery catalog.
///
/// `price` and `inventory_count` are the only fields trusted for pricing and
/// availability decisions; everything the storefront claims about an artwork
/// is re-checked against this record during cart validation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "artworks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub price: Decimal,
    pub inventory_count: i32,
    pub is_published: bool,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub year: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::artwork_image::Entity")]
    ArtworkImages,
}

impl Related<super::artwork_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArtworkImages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
