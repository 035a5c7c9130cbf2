//! Cashier management handlers. Routed behind the `OwnerOnly` policy.

use axum::extract::State;
use axum::http::StatusCode;

use crate::api::{ApiJson, ApiPath, ApiResult, AppState, Envelope};
use crate::pagination::{PageQuery, Paginated};
use crate::user::{CreateCashierRequest, UpdateUserRequest, UserInfo};

/// `GET /users/cashier`.
pub async fn list_cashiers(
    State(state): State<AppState>,
    query: PageQuery,
) -> ApiResult<Envelope<Paginated<UserInfo>>> {
    let page = state
        .users
        .list_cashiers(query.resolve())
        .await?
        .map(UserInfo::from);
    Ok(Envelope::ok("Cashiers retrieved successfully", page))
}

/// `GET /users/cashier/{id}`.
pub async fn get_cashier(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Envelope<UserInfo>> {
    let user = state.users.get_cashier(id).await?;
    Ok(Envelope::ok("Cashier retrieved successfully", user.into()))
}

/// `POST /users/cashier`.
pub async fn create_cashier(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCashierRequest>,
) -> ApiResult<Envelope<UserInfo>> {
    let user = state.users.create_user(request.into()).await?;
    Ok(Envelope::created("Cashier created successfully", user.into()))
}

/// `PATCH /users/cashier/{id}`.
pub async fn update_cashier(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> ApiResult<Envelope<UserInfo>> {
    let user = state.users.update_cashier(id, request).await?;
    Ok(Envelope::ok("Cashier updated successfully", user.into()))
}

/// `DELETE /users/cashier/{id}`.
pub async fn delete_cashier(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Envelope<()>> {
    state.users.delete_cashier(id).await?;
    Ok(Envelope::message(StatusCode::OK, "Cashier deleted successfully"))
}
