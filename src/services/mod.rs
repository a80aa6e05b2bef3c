pub mod cart;
pub mod catalog;
pub mod exhibitions;
pub mod media;
pub mod orders;
pub mod payments;
pub mod projects;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use exhibitions::ExhibitionService;
pub use media::MediaService;
pub use orders::OrderService;
pub use payments::StripeClient;
pub use projects::ProjectService;
