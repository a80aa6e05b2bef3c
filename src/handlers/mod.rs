pub mod artworks;
pub mod checkout;
pub mod exhibitions;
pub mod orders;
pub mod payment_webhooks;
pub mod projects;
pub mod uploads;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::{
    CartService, CatalogService, ExhibitionService, MediaService, OrderService, ProjectService,
    StripeClient,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub cart: Arc<CartService>,
    pub catalog: Arc<CatalogService>,
    pub orders: Arc<OrderService>,
    pub media: Arc<MediaService>,
    pub stripe: Arc<StripeClient>,
    pub projects: Arc<ProjectService>,
    pub exhibitions: Arc<ExhibitionService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            cart: Arc::new(CartService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            catalog: Arc::new(CatalogService::new(db.clone(), event_sender.clone())),
            orders: Arc::new(OrderService::new(db.clone(), event_sender)),
            media: Arc::new(MediaService::new()),
            stripe: Arc::new(StripeClient::from_config(&config)),
            projects: Arc::new(ProjectService::new(db.clone())),
            exhibitions: Arc::new(ExhibitionService::new(db)),
        }
    }
}
