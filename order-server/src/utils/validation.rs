//! Input validation helpers
//!
//! Text length limits plus the pricing-policy and order payload checks
//! shared by the HTTP handlers and the order service.

use crate::orders::OrderError;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    DiscountTier, OrderCreate, OrderUpdate, PolicyKind, ServiceDetail, normalize_ratio,
};
use rust_decimal::Decimal;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: client, project, policy, service
pub const MAX_NAME_LEN: usize = 200;

/// Descriptions and notes
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, contact name
pub const MAX_SHORT_TEXT_LEN: usize = 100;

// ── Line item limits ────────────────────────────────────────────────

/// Largest accepted unit price (一万亿)
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000_000;

/// Largest accepted quantity per line item
pub const MAX_QUANTITY: u32 = 1_000_000;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    check_required(value, field, max_len).map_err(AppError::validation)
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    check_optional(value, field, max_len).map_err(AppError::validation)
}

/// Validate a policy definition. Ratios may be legacy fractions (0.85).
pub fn validate_policy_kind(kind: &PolicyKind) -> Result<(), AppError> {
    match kind {
        PolicyKind::UniformDiscount { discount_ratio } => validate_ratio(*discount_ratio, "discount_ratio"),
        PolicyKind::TieredDiscount { tiers } => validate_tiers(tiers),
    }
}

fn validate_ratio(ratio: Decimal, field: &str) -> Result<(), AppError> {
    if normalize_ratio(ratio).is_none() {
        return Err(AppError::with_message(
            ErrorCode::PricingRatioInvalid,
            format!("{field} must be in (0, 100], got {ratio}"),
        )
        .with_detail("field", field)
        .with_detail("value", ratio.to_string()));
    }
    Ok(())
}

fn validate_tiers(tiers: &[DiscountTier]) -> Result<(), AppError> {
    if tiers.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::PricingTierInvalid,
            "tiered discount needs at least one tier",
        ));
    }
    for (index, tier) in tiers.iter().enumerate() {
        if tier.start_quantity < 1 {
            return Err(AppError::with_message(
                ErrorCode::PricingTierInvalid,
                format!("tier {index}: start_quantity must be at least 1"),
            ));
        }
        if let Some(end) = tier.end_quantity
            && end < tier.start_quantity
        {
            return Err(AppError::with_message(
                ErrorCode::PricingTierInvalid,
                format!(
                    "tier {index}: end_quantity {end} is below start_quantity {}",
                    tier.start_quantity
                ),
            ));
        }
        validate_ratio(tier.discount_ratio, &format!("tiers[{index}].discount_ratio"))?;
    }
    Ok(())
}

/// Validate a single priced line (price preview).
pub fn validate_line_item(unit_price: Decimal, quantity: Option<u32>) -> Result<(), AppError> {
    check_line_item(unit_price, quantity, "line item").map_err(AppError::validation)
}

// ── Validation helpers (Order service) ──────────────────────────────

/// Validate a create payload before anything is priced or written.
pub fn validate_order_create(input: &OrderCreate) -> Result<(), OrderError> {
    check_required(&input.client_id, "client_id", MAX_NAME_LEN).map_err(OrderError::Validation)?;
    check_required(&input.client_name, "client_name", MAX_NAME_LEN)
        .map_err(OrderError::Validation)?;
    check_required(&input.project_name, "project_name", MAX_NAME_LEN)
        .map_err(OrderError::Validation)?;
    check_optional(&input.contact_name, "contact_name", MAX_SHORT_TEXT_LEN)
        .map_err(OrderError::Validation)?;
    check_optional(&input.contact_phone, "contact_phone", MAX_SHORT_TEXT_LEN)
        .map_err(OrderError::Validation)?;
    validate_service_details(&input.service_details)
}

/// Validate the fields present in an update payload.
pub fn validate_order_update(patch: &OrderUpdate) -> Result<(), OrderError> {
    for (value, field) in [
        (&patch.client_id, "client_id"),
        (&patch.client_name, "client_name"),
        (&patch.project_name, "project_name"),
    ] {
        if let Some(v) = value {
            check_required(v, field, MAX_NAME_LEN).map_err(OrderError::Validation)?;
        }
    }
    check_optional(&patch.contact_name, "contact_name", MAX_SHORT_TEXT_LEN)
        .map_err(OrderError::Validation)?;
    check_optional(&patch.contact_phone, "contact_phone", MAX_SHORT_TEXT_LEN)
        .map_err(OrderError::Validation)?;
    if let Some(details) = &patch.service_details {
        validate_service_details(details)?;
    }
    Ok(())
}

fn validate_service_details(details: &[ServiceDetail]) -> Result<(), OrderError> {
    for service in details {
        if service.id.trim().is_empty() {
            return Err(OrderError::Validation(
                "service id must not be empty".to_string(),
            ));
        }
        check_line_item(
            service.unit_price,
            service.quantity,
            &format!("service {}", service.id),
        )
        .map_err(OrderError::Validation)?;
    }
    Ok(())
}

fn check_line_item(unit_price: Decimal, quantity: Option<u32>, label: &str) -> Result<(), String> {
    if unit_price.is_sign_negative() && !unit_price.is_zero() {
        return Err(format!("{label} has a negative unit_price"));
    }
    if unit_price > Decimal::from(MAX_UNIT_PRICE) {
        return Err(format!(
            "{label} unit_price {unit_price} exceeds {MAX_UNIT_PRICE}"
        ));
    }
    if let Some(q) = quantity
        && q > MAX_QUANTITY
    {
        return Err(format!("{label} quantity {q} exceeds {MAX_QUANTITY}"));
    }
    Ok(())
}

fn check_required(value: &str, field: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if value.chars().count() > max_len {
        return Err(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        ));
    }
    Ok(())
}

fn check_optional(value: &Option<String>, field: &str, max_len: usize) -> Result<(), String> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        ));
    }
    Ok(())
}
