/*!
 * yoa-api: backend for an individual artist's gallery and shop.
 *
 * Storefront surface: catalog browsing, cart validation, checkout (payment
 * intent creation) and the payment webhook that materializes orders. Admin
 * surface: artwork, order, project and exhibition management. Authentication
 * for the admin surface is handled upstream by the deployment, not here.
 */

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

pub use handlers::AppServices;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: Arc<events::EventSender>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<sea_orm::DatabaseConnection>,
        config: Arc<config::AppConfig>,
        event_sender: Arc<events::EventSender>,
    ) -> Self {
        let services = AppServices::new(db.clone(), event_sender.clone(), config.clone());
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, query: &ListQuery) -> Self {
        let limit = query.limit.max(1);
        Self {
            items,
            total,
            page: query.page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn api_v1_routes() -> Router<AppState> {
    let storefront = Router::new()
        .route("/artworks", get(handlers::artworks::list_artworks))
        .route("/artworks/:slug", get(handlers::artworks::get_artwork_by_slug))
        .route(
            "/artworks/:slug/images",
            get(handlers::artworks::list_artwork_images),
        )
        .route("/projects", get(handlers::projects::list_projects))
        .route("/exhibitions", get(handlers::exhibitions::list_exhibitions))
        .route("/cart/validate", post(handlers::checkout::validate_cart))
        .route("/checkout", post(handlers::checkout::checkout))
        .route(
            "/webhooks/payments",
            post(handlers::payment_webhooks::handle_payment_webhook),
        );

    let admin = Router::new()
        .route(
            "/artworks",
            get(handlers::artworks::admin_list_artworks).post(handlers::artworks::create_artwork),
        )
        .route(
            "/artworks/:id",
            get(handlers::artworks::admin_get_artwork)
                .put(handlers::artworks::update_artwork)
                .delete(handlers::artworks::delete_artwork),
        )
        .route(
            "/artworks/:id/publish",
            put(handlers::artworks::publish_artwork),
        )
        .route(
            "/artworks/:id/images",
            post(handlers::uploads::upload_artwork_image),
        )
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/:id", get(handlers::orders::get_order))
        .route("/orders/:id/status", put(handlers::orders::update_order_status))
        .route("/orders/:id/cancel", post(handlers::orders::cancel_order))
        .route(
            "/orders/:id/tracking",
            put(handlers::orders::set_tracking_number),
        )
        .route("/orders/:id/notes", put(handlers::orders::set_notes))
        .route(
            "/projects",
            get(handlers::projects::admin_list_projects).post(handlers::projects::create_project),
        )
        .route(
            "/projects/:id",
            put(handlers::projects::update_project).delete(handlers::projects::delete_project),
        )
        .route(
            "/exhibitions",
            get(handlers::exhibitions::admin_list_exhibitions)
                .post(handlers::exhibitions::create_exhibition),
        )
        .route(
            "/exhibitions/:id",
            put(handlers::exhibitions::update_exhibition)
                .delete(handlers::exhibitions::delete_exhibition),
        );

    Router::new()
        .nest("/api/v1", storefront)
        .nest("/api/v1/admin", admin)
        .route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_math() {
        let query = ListQuery { page: 2, limit: 20 };
        let page: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 45, &query);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);

        let zero_limit = ListQuery { page: 1, limit: 0 };
        let page: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 45, &zero_limit);
        assert_eq!(page.limit, 1);
    }

    #[test]
    fn api_response_shapes() {
        let ok = ApiResponse::success(7);
        assert!(ok.success);
        assert_eq!(ok.data, Some(7));

        let err = ApiResponse::<()>::error("oops".into());
        assert!(!err.success);
        assert_eq!(err.message.as_deref(), Some("oops"));
    }
}
