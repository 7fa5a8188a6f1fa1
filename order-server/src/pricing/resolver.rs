//! Pricing Policy Resolver
//!
//! Resolves one line item against the selected policies and keeps the
//! result with the lowest final price. Unknown, inactive or malformed
//! policies are skipped; when nothing applies the original price passes
//! through unchanged.

use rust_decimal::prelude::*;
use shared::models::{
    AppliedPolicy, DiscountTier, PolicyKind, PriceCalculationResult, PricingPolicy,
    normalize_ratio,
};

use super::currency::{format_amount, round_money};

pub const NO_POLICY_SELECTED: &str = "未应用价格政策";
pub const NO_POLICY_FOUND: &str = "未找到适用的价格政策";

/// Price breakdown for one policy, before it competes with the others
struct Candidate {
    discounted: Decimal,
    ratio: Decimal,
    lines: Vec<String>,
}

/// Resolve the best price for `original_price` (the line total for
/// `quantity` units) among the policies named in `selected_policy_ids`.
pub fn resolve(
    original_price: Decimal,
    quantity: u32,
    unit: &str,
    policies: &[PricingPolicy],
    selected_policy_ids: &[String],
) -> PriceCalculationResult {
    if selected_policy_ids.is_empty() {
        return passthrough(original_price, NO_POLICY_SELECTED);
    }

    let mut best: Option<PriceCalculationResult> = None;

    for policy_id in selected_policy_ids {
        let Some(policy) = policies.iter().find(|p| &p.id == policy_id) else {
            tracing::warn!(policy_id = %policy_id, "Selected pricing policy not found, skipping");
            continue;
        };
        if !policy.is_active() {
            tracing::debug!(policy_id = %policy_id, "Pricing policy inactive, skipping");
            continue;
        }

        let candidate = match &policy.kind {
            PolicyKind::UniformDiscount { discount_ratio } => {
                uniform(original_price, *discount_ratio)
            }
            PolicyKind::TieredDiscount { tiers } => tiered(original_price, quantity, unit, tiers),
        };
        let Some(candidate) = candidate else {
            tracing::warn!(
                policy_id = %policy_id,
                policy_type = policy.kind.type_name(),
                "Pricing policy has an invalid discount ratio or overflows, skipping"
            );
            continue;
        };

        let result = finish(original_price, policy, candidate);
        let better = best
            .as_ref()
            .is_none_or(|b| result.discounted_price < b.discounted_price);
        if better {
            best = Some(result);
        }
    }

    best.unwrap_or_else(|| passthrough(original_price, NO_POLICY_FOUND))
}

fn passthrough(original_price: Decimal, details: &str) -> PriceCalculationResult {
    PriceCalculationResult {
        original_price,
        discounted_price: original_price,
        discount_amount: Decimal::ZERO,
        discount_ratio: Decimal::ONE_HUNDRED,
        applied_policy: None,
        calculation_details: details.to_string(),
    }
}

fn uniform(original_price: Decimal, discount_ratio: Decimal) -> Option<Candidate> {
    let ratio = normalize_ratio(discount_ratio)?;
    Some(Candidate {
        discounted: original_price.checked_mul(ratio)? / Decimal::ONE_HUNDRED,
        ratio,
        lines: vec![format!("按{}%计费", ratio.normalize())],
    })
}

fn tiered(
    original_price: Decimal,
    quantity: u32,
    unit: &str,
    tiers: &[DiscountTier],
) -> Option<Candidate> {
    let mut sorted: Vec<(&DiscountTier, Decimal)> = Vec::with_capacity(tiers.len());
    for tier in tiers {
        sorted.push((tier, normalize_ratio(tier.discount_ratio)?));
    }
    sorted.sort_by_key(|(tier, _)| tier.start_quantity);

    let quantity = quantity.max(1);
    let divisor = Decimal::from(quantity) * Decimal::ONE_HUNDRED;
    let mut remaining = i64::from(quantity);
    let mut total = Decimal::ZERO;
    let mut lines = Vec::new();

    for (tier, ratio) in sorted {
        let start = i64::from(tier.start_quantity);
        let capacity = match tier.end_quantity {
            Some(end) => i64::from(end) - start + 1,
            None => remaining,
        };
        let applied = remaining.min(capacity).max(0);

        if applied > 0 {
            let amount = original_price
                .checked_mul(Decimal::from(applied))?
                .checked_mul(ratio)?
                .checked_div(divisor)?;
            total = total.checked_add(amount)?;

            let range = match tier.end_quantity {
                None => format!("{start}{unit}以上"),
                Some(end) if i64::from(end) == start => format!("第{start}{unit}"),
                Some(end) => format!("第{start}-{end}{unit}"),
            };
            lines.push(format!(
                "{range}按{}%计费: ¥{}",
                ratio.normalize(),
                format_amount(amount)
            ));
        }

        remaining -= applied;
        if remaining <= 0 {
            break;
        }
    }

    let discounted = round_money(total);
    let ratio = if original_price.is_zero() {
        Decimal::ONE_HUNDRED
    } else {
        (discounted / original_price * Decimal::ONE_HUNDRED).round_dp(2)
    };

    Some(Candidate {
        discounted,
        ratio,
        lines,
    })
}

fn finish(
    original_price: Decimal,
    policy: &PricingPolicy,
    candidate: Candidate,
) -> PriceCalculationResult {
    let discounted_price = round_money(candidate.discounted);
    let discount_amount = original_price - discounted_price;

    let mut details = format!("价格政策: {}({})\n", policy.name, policy.kind.label());
    for line in &candidate.lines {
        details.push_str(line);
        details.push('\n');
    }
    details.push('\n');
    details.push_str(&format!("原价: ¥{}\n", format_amount(original_price)));
    details.push_str(&format!("优惠金额: ¥{}\n", format_amount(discount_amount)));
    details.push_str(&format!("最终价格: ¥{}", format_amount(discounted_price)));

    PriceCalculationResult {
        original_price,
        discounted_price,
        discount_amount,
        discount_ratio: candidate.ratio,
        applied_policy: Some(AppliedPolicy {
            id: policy.id.clone(),
            name: policy.name.clone(),
            policy_type: policy.kind.type_name().to_string(),
        }),
        calculation_details: details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::models::PolicyStatus;

    fn policy(id: &str, name: &str, kind: PolicyKind) -> PricingPolicy {
        PricingPolicy {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            kind,
            status: PolicyStatus::Active,
            service_id: None,
            selected_services: vec![],
            created_at: 0,
            updated_at: 0,
        }
    }

    fn uniform_policy(id: &str, ratio: Decimal) -> PricingPolicy {
        policy(
            id,
            &format!("折扣{id}"),
            PolicyKind::UniformDiscount {
                discount_ratio: ratio,
            },
        )
    }

    fn tier(start: u32, end: Option<u32>, ratio: Decimal) -> DiscountTier {
        DiscountTier {
            start_quantity: start,
            end_quantity: end,
            discount_ratio: ratio,
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_selection_passthrough() {
        let policies = vec![uniform_policy("a", dec!(50))];
        let result = resolve(dec!(999.99), 7, "件", &policies, &[]);
        assert_eq!(result.discounted_price, dec!(999.99));
        assert_eq!(result.discount_amount, dec!(0));
        assert_eq!(result.discount_ratio, dec!(100));
        assert!(result.applied_policy.is_none());
        assert_eq!(result.calculation_details, NO_POLICY_SELECTED);
    }

    #[test]
    fn test_lowest_final_price_wins() {
        let policies = vec![uniform_policy("a", dec!(90)), uniform_policy("b", dec!(70))];
        let result = resolve(dec!(1000), 1, "项", &policies, &ids(&["a", "b"]));
        assert_eq!(result.discounted_price, dec!(700));
        assert_eq!(result.discount_amount, dec!(300));
        assert_eq!(result.applied_policy.unwrap().id, "b");

        // Selection order does not matter
        let result = resolve(dec!(1000), 1, "项", &policies, &ids(&["b", "a"]));
        assert_eq!(result.discounted_price, dec!(700));
    }

    #[test]
    fn test_tie_keeps_first_selected() {
        let policies = vec![uniform_policy("a", dec!(80)), uniform_policy("b", dec!(0.8))];
        let result = resolve(dec!(100), 1, "项", &policies, &ids(&["b", "a"]));
        assert_eq!(result.discounted_price, dec!(80));
        assert_eq!(result.applied_policy.unwrap().id, "b");
    }

    #[test]
    fn test_uniform_details() {
        let policies = vec![policy(
            "p",
            "八五折",
            PolicyKind::UniformDiscount {
                discount_ratio: dec!(85),
            },
        )];
        let result = resolve(dec!(3000), 3, "项", &policies, &ids(&["p"]));
        assert_eq!(result.discounted_price, dec!(2550));
        assert_eq!(result.discount_amount, dec!(450));
        assert_eq!(result.discount_ratio, dec!(85));
        assert_eq!(
            result.calculation_details,
            "价格政策: 八五折(统一折扣)\n按85%计费\n\n原价: ¥3,000\n优惠金额: ¥450\n最终价格: ¥2,550"
        );
        let applied = result.applied_policy.unwrap();
        assert_eq!(applied.policy_type, "uniform_discount");
    }

    #[test]
    fn test_legacy_decimal_ratio_normalized() {
        let policies = vec![uniform_policy("a", dec!(0.85))];
        let result = resolve(dec!(200), 1, "项", &policies, &ids(&["a"]));
        assert_eq!(result.discounted_price, dec!(170));
        assert_eq!(result.discount_ratio, dec!(85));
    }

    #[test]
    fn test_tiered_exhaustion() {
        let policies = vec![policy(
            "t",
            "批量优惠",
            PolicyKind::TieredDiscount {
                tiers: vec![
                    tier(11, None, dec!(60)),
                    tier(1, Some(5), dec!(100)),
                    tier(6, Some(10), dec!(80)),
                ],
            },
        )];
        let result = resolve(dec!(120), 12, "个", &policies, &ids(&["t"]));
        assert_eq!(result.original_price, dec!(120));
        assert_eq!(result.discounted_price, dec!(102));
        assert_eq!(result.discount_amount, dec!(18));
        assert_eq!(result.discount_ratio, dec!(85));
        assert_eq!(
            result.calculation_details,
            "价格政策: 批量优惠(阶梯折扣)\n\
             第1-5个按100%计费: ¥50\n\
             第6-10个按80%计费: ¥40\n\
             11个以上按60%计费: ¥12\n\
             \n\
             原价: ¥120\n\
             优惠金额: ¥18\n\
             最终价格: ¥102"
        );
    }

    #[test]
    fn test_tiered_stops_when_exhausted() {
        let policies = vec![policy(
            "t",
            "阶梯",
            PolicyKind::TieredDiscount {
                tiers: vec![tier(1, Some(1), dec!(100)), tier(2, None, dec!(50))],
            },
        )];
        let result = resolve(dec!(10), 1, "次", &policies, &ids(&["t"]));
        assert_eq!(result.discounted_price, dec!(10));
        assert!(result.calculation_details.contains("第1次按100%计费: ¥10"));
        assert!(!result.calculation_details.contains("以上"));
    }

    #[test]
    fn test_inactive_policy_ignored() {
        let mut cheap = uniform_policy("cheap", dec!(10));
        cheap.status = PolicyStatus::Inactive;
        let policies = vec![cheap, uniform_policy("normal", dec!(90))];

        let result = resolve(dec!(100), 1, "项", &policies, &ids(&["cheap", "normal"]));
        assert_eq!(result.discounted_price, dec!(90));

        let result = resolve(dec!(100), 1, "项", &policies, &ids(&["cheap"]));
        assert_eq!(result.discounted_price, dec!(100));
        assert_eq!(result.discount_amount, dec!(0));
        assert_eq!(result.calculation_details, NO_POLICY_FOUND);
    }

    #[test]
    fn test_missing_and_invalid_policies_skipped() {
        let policies = vec![uniform_policy("bad", dec!(150)), uniform_policy("zero", dec!(0))];
        let result = resolve(dec!(100), 1, "项", &policies, &ids(&["ghost", "bad", "zero"]));
        assert_eq!(result.discounted_price, dec!(100));
        assert_eq!(result.calculation_details, NO_POLICY_FOUND);
    }

    #[test]
    fn test_result_rounded_to_cents() {
        let policies = vec![uniform_policy("a", dec!(33))];
        let result = resolve(dec!(10.01), 1, "项", &policies, &ids(&["a"]));
        // 10.01 * 0.33 = 3.3033
        assert_eq!(result.discounted_price, dec!(3.30));
        assert_eq!(result.discount_amount, dec!(6.71));
        assert!(result.discounted_price <= result.original_price);
    }

    #[test]
    fn test_overflowing_amount_is_skipped_not_panicking() {
        let tiers = PolicyKind::TieredDiscount {
            tiers: vec![DiscountTier {
                start_quantity: 1,
                end_quantity: None,
                discount_ratio: dec!(90),
            }],
        };
        let policies = vec![uniform_policy("u", dec!(85)), policy("t", "阶梯", tiers)];
        let result = resolve(Decimal::MAX, 3, "项", &policies, &ids(&["u", "t"]));
        assert_eq!(result.discounted_price, Decimal::MAX);
        assert_eq!(result.discount_amount, dec!(0));
        assert_eq!(result.calculation_details, NO_POLICY_FOUND);
    }
}
