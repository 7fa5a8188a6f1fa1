//! Order API Handlers

use axum::{Json, extract::State};
use serde::Serialize;

use crate::api::extract::{AppJson, AppPath, AppQuery};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};
use shared::models::{
    Order, OrderCreate, OrderQuery, OrderStatusUpdate, OrderUpdate, OrderVersion,
    PaginatedResponse,
};

/// GET /api/orders - 分页查询订单
pub async fn list(
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<OrderQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Order>>>> {
    let page = state.order_service().get_orders(query).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// POST /api/orders - 创建订单 (生成版本 1)
pub async fn create(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<OrderCreate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.order_service().create_order(payload).await?;
    Ok(Json(ApiResponse::success_with_message("Order created", order)))
}

/// GET /api/orders/{id} - 获取订单
pub async fn get_by_id(
    State(state): State<ServerState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.order_service().get_order_by_id(&id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// PUT /api/orders/{id} - 更新订单 (定价字段齐全时生成新版本)
pub async fn update(
    State(state): State<ServerState>,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<OrderUpdate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.order_service().update_order(&id, payload).await?;
    Ok(Json(ApiResponse::success_with_message("Order updated", order)))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: String,
}

/// DELETE /api/orders/{id} - 删除订单 (保留版本)
pub async fn delete(
    State(state): State<ServerState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    state.order_service().delete_order(&id).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Order deleted",
        Deleted { id },
    )))
}

/// PUT /api/orders/{id}/status - 更新订单状态
pub async fn update_status(
    State(state): State<ServerState>,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<OrderStatusUpdate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state
        .order_service()
        .update_order_status(&id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// GET /api/orders/{id}/versions - 版本历史 (新到旧)
pub async fn list_versions(
    State(state): State<ServerState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<ApiResponse<Vec<OrderVersion>>>> {
    let versions = state.order_service().get_order_version_history(&id).await?;
    Ok(Json(ApiResponse::success(versions)))
}

#[derive(Debug, Serialize)]
pub struct VersionsDeleted {
    pub order_id: String,
    pub removed: u64,
}

/// DELETE /api/orders/{id}/versions - 删除订单全部版本
pub async fn delete_versions(
    State(state): State<ServerState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<ApiResponse<VersionsDeleted>>> {
    let removed = state.order_service().delete_order_versions(&id).await?;
    Ok(Json(ApiResponse::success(VersionsDeleted {
        order_id: id,
        removed,
    })))
}

/// GET /api/orders/{id}/versions/latest - 最新版本快照
pub async fn get_latest_version(
    State(state): State<ServerState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<ApiResponse<OrderVersion>>> {
    let version = state.order_service().get_latest_snapshot(&id).await?;
    Ok(Json(ApiResponse::success(version)))
}

/// GET /api/orders/{id}/versions/{version} - 指定版本快照
pub async fn get_version(
    State(state): State<ServerState>,
    AppPath((id, version)): AppPath<(String, i64)>,
) -> AppResult<Json<ApiResponse<OrderVersion>>> {
    let snapshot = state
        .order_service()
        .get_order_snapshot(&id, version)
        .await?;
    Ok(Json(ApiResponse::success(snapshot)))
}
