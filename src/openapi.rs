use utoipa::OpenApi;

/// OpenAPI document for the service. Served as raw JSON from `/api/docs`
/// consumers; no UI is bundled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "YOA API",
        description = r#"
Backend for an individual artist's gallery and shop.

Storefront endpoints cover catalog browsing, cart validation, checkout and
the payment webhook. Admin endpoints manage artworks, orders, projects and
exhibitions; the admin surface is expected to sit behind an upstream
authentication gate.

Carts are always re-priced server-side: client-claimed prices are never
trusted, and orders are only created from verified payment webhooks.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Storefront", description = "Public catalog and checkout endpoints"),
        (name = "Webhooks", description = "Payment processor callbacks"),
        (name = "Admin", description = "Back-office management endpoints")
    ),
    paths(
        crate::handlers::artworks::list_artworks,
        crate::handlers::artworks::get_artwork_by_slug,
        crate::handlers::artworks::create_artwork,
        crate::handlers::checkout::checkout,
        crate::handlers::checkout::validate_cart,
        crate::handlers::payment_webhooks::handle_payment_webhook,
        crate::handlers::uploads::upload_artwork_image,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::cart::CartLine,
        crate::services::cart::ValidatedCart,
        crate::handlers::checkout::Address,
        crate::handlers::checkout::CheckoutRequest,
        crate::handlers::checkout::CheckoutResponse,
        crate::handlers::artworks::CreateArtworkRequest,
        crate::handlers::artworks::UpdateArtworkRequest,
        crate::handlers::orders::UpdateStatusRequest,
        crate::handlers::orders::TrackingRequest,
        crate::handlers::orders::NotesRequest,
    ))
)]
pub struct ApiDoc;
