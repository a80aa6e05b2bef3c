pub mod artwork;
pub mod artwork_image;
pub mod exhibition;
pub mod order;
pub mod order_item;
pub mod project;

pub use artwork::Entity as Artwork;
pub use artwork_image::Entity as ArtworkImage;
pub use exhibition::Entity as Exhibition;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use project::Entity as Project;
