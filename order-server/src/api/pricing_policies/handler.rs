//! Pricing Policy API Handlers

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::extract::{AppJson, AppPath, AppQuery};
use crate::core::ServerState;
use crate::db::repository::{PricingPolicyRepository, RepoError};
use crate::pricing::resolve;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_line_item, validate_optional_text,
    validate_policy_kind, validate_required_text,
};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{
    PolicyStatus, PriceCalculationResult, PricingPolicy, PricingPolicyCreate,
    PricingPolicyUpdate,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<PolicyStatus>,
}

/// GET /api/pricing-policies - 获取价格政策 (可按状态过滤)
pub async fn list(
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<PricingPolicy>>>> {
    let repo = PricingPolicyRepository::new(state.store.clone());
    let policies = repo.find_all(query.status).await?;
    Ok(Json(ApiResponse::success(policies)))
}

/// GET /api/pricing-policies/{id} - 获取单个价格政策
pub async fn get_by_id(
    State(state): State<ServerState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<ApiResponse<PricingPolicy>>> {
    let repo = PricingPolicyRepository::new(state.store.clone());
    let policy = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::policy_not_found(&id))?;
    Ok(Json(ApiResponse::success(policy)))
}

/// POST /api/pricing-policies - 创建价格政策
pub async fn create(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<PricingPolicyCreate>,
) -> AppResult<Json<ApiResponse<PricingPolicy>>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_policy_kind(&payload.kind)?;

    let repo = PricingPolicyRepository::new(state.store.clone());
    let policy = repo.create(payload).await.map_err(name_conflict)?;

    tracing::info!(policy_id = %policy.id, name = %policy.name, "Pricing policy created");
    Ok(Json(ApiResponse::success(policy)))
}

/// PUT /api/pricing-policies/{id} - 更新价格政策
///
/// 已生成的订单版本保存的是政策快照，不受影响
pub async fn update(
    State(state): State<ServerState>,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<PricingPolicyUpdate>,
) -> AppResult<Json<ApiResponse<PricingPolicy>>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    if let Some(kind) = &payload.kind {
        validate_policy_kind(kind)?;
    }

    let repo = PricingPolicyRepository::new(state.store.clone());
    let policy = repo.update(&id, payload).await.map_err(|e| match e {
        RepoError::NotFound(_) => AppError::policy_not_found(&id),
        other => name_conflict(other),
    })?;

    tracing::info!(policy_id = %policy.id, "Pricing policy updated");
    Ok(Json(ApiResponse::success(policy)))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: String,
}

/// DELETE /api/pricing-policies/{id} - 删除价格政策
pub async fn delete(
    State(state): State<ServerState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    let repo = PricingPolicyRepository::new(state.store.clone());
    if !repo.delete(&id).await? {
        return Err(AppError::policy_not_found(&id));
    }
    tracing::info!(policy_id = %id, "Pricing policy deleted");
    Ok(Json(ApiResponse::success(Deleted { id })))
}

/// Preview request: price one line item against stored policies
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub unit_price: Decimal,
    /// Missing or zero means 1
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub policy_ids: Vec<String>,
}

/// POST /api/pricing-policies/preview - 试算价格，不落库
pub async fn preview(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<PreviewRequest>,
) -> AppResult<Json<ApiResponse<PriceCalculationResult>>> {
    validate_line_item(payload.unit_price, payload.quantity)?;

    let quantity = payload.quantity.filter(|q| *q > 0).unwrap_or(1);
    let original_price = payload.unit_price * Decimal::from(quantity);

    let repo = PricingPolicyRepository::new(state.store.clone());
    let policies = repo.find_by_ids(&payload.policy_ids).await?;
    let result = resolve(
        original_price,
        quantity,
        &payload.unit,
        &policies,
        &payload.policy_ids,
    );
    Ok(Json(ApiResponse::success(result)))
}

fn name_conflict(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(msg) => {
            AppError::with_message(ErrorCode::PricingPolicyNameExists, msg)
        }
        other => other.into(),
    }
}
