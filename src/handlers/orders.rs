use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{order, order::OrderStatus, order_item},
    errors::ServiceError,
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackingRequest {
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotesRequest {
    pub notes: Option<String>,
}

// An order identifier in the admin UI may be the row UUID or the public
// order number.
async fn resolve_order(state: &AppState, id: &str) -> Result<order::Model, ServiceError> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return state.services.orders.get_order(uuid).await;
    }
    state.services.orders.get_by_order_number(id).await
}

/// List orders
#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    summary = "List orders",
    description = "Paginated order list, newest first",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<PaginatedResponse<order::Model>>),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<order::Model>> {
    let (items, total) = state
        .services
        .orders
        .list_orders(query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}

/// Get an order with its line items
#[utoipa::path(
    get,
    path = "/api/v1/admin/orders/{id}",
    summary = "Get order",
    params(("id" = String, Path, description = "Order UUID or public order number")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<OrderWithItems> {
    let found = resolve_order(&state, &id).await?;
    let items = state.services.orders.get_order_items(found.id).await?;
    Ok(Json(ApiResponse::success(OrderWithItems {
        order: found,
        items,
    })))
}

/// Update order status
#[utoipa::path(
    put,
    path = "/api/v1/admin/orders/{id}/status",
    summary = "Update order status",
    description = "Admin-driven status change. State jumps are allowed; \
                   cancelled orders cannot change status.",
    params(("id" = String, Path, description = "Order UUID or public order number")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<order::Model>),
        (status = 400, description = "Unknown or disallowed status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<order::Model> {
    let new_status = OrderStatus::parse(&request.status).ok_or_else(|| {
        ServiceError::InvalidStatus(format!("Unknown order status: {}", request.status))
    })?;
    let found = resolve_order(&state, &id).await?;
    let updated = state
        .services
        .orders
        .update_status(found.id, new_status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<order::Model> {
    let found = resolve_order(&state, &id).await?;
    let cancelled = state.services.orders.cancel_order(found.id).await?;
    Ok(Json(ApiResponse::success(cancelled)))
}

pub async fn set_tracking_number(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TrackingRequest>,
) -> ApiResult<order::Model> {
    let found = resolve_order(&state, &id).await?;
    let updated = state
        .services
        .orders
        .set_tracking_number(found.id, request.tracking_number)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn set_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<NotesRequest>,
) -> ApiResult<order::Model> {
    let found = resolve_order(&state, &id).await?;
    let updated = state
        .services
        .orders
        .set_notes(found.id, request.notes)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
