//! Sale order handlers. Routed behind the `AnyStaff` policy.

use axum::extract::State;
use axum::http::StatusCode;

use crate::api::{ApiJson, ApiPath, ApiResult, AppState, Envelope};
use crate::auth::{AnyStaff, Authorized};
use crate::pagination::{PageQuery, Paginated};
use crate::sale_order::{CreateSaleOrderRequest, SaleOrderDetail, UpdateSaleOrderRequest};

/// `GET /sale-orders`.
pub async fn list_sale_orders(
    State(state): State<AppState>,
    query: PageQuery,
) -> ApiResult<Envelope<Paginated<SaleOrderDetail>>> {
    let page = state.sale_orders.list(query.resolve()).await?;
    Ok(Envelope::ok("Sale orders retrieved successfully", page))
}

/// `GET /sale-orders/{id}`.
pub async fn get_sale_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Envelope<SaleOrderDetail>> {
    let order = state.sale_orders.get(id).await?;
    Ok(Envelope::ok("Sale order retrieved successfully", order))
}

/// `POST /sale-orders`. The creator is the authenticated user.
pub async fn create_sale_order(
    State(state): State<AppState>,
    user: Authorized<AnyStaff>,
    ApiJson(request): ApiJson<CreateSaleOrderRequest>,
) -> ApiResult<Envelope<SaleOrderDetail>> {
    let order = state.sale_orders.create(user.user_id(), request).await?;
    Ok(Envelope::created("Sale order created successfully", order))
}

/// `PATCH /sale-orders/{id}`.
pub async fn update_sale_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateSaleOrderRequest>,
) -> ApiResult<Envelope<SaleOrderDetail>> {
    let order = state.sale_orders.update(id, request).await?;
    Ok(Envelope::ok("Sale order updated successfully", order))
}

/// `DELETE /sale-orders/{id}`.
pub async fn delete_sale_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Envelope<()>> {
    state.sale_orders.delete(id).await?;
    Ok(Envelope::message(StatusCode::OK, "Sale order deleted successfully"))
}
