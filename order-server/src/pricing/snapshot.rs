//! Order Snapshot Builder
//!
//! Prices every selected service and assembles the full computed state of
//! one order version. Pure: numbering and persistence belong to the
//! version sequencer.

use rust_decimal::Decimal;
use shared::models::{
    CalculationSummary, ClientInfo, OrderItemSnapshot, OrderSnapshot, PricingPolicy,
    PricingPolicySnapshot, ServiceDetail,
};

use super::currency::{format_amount, render_rmb};
use super::resolver::resolve;

/// Build the snapshot for `version`.
///
/// `service_details` is filtered by `selected_service_ids` without being
/// reordered.
pub fn build_snapshot(
    version: i64,
    client: ClientInfo,
    project_name: &str,
    selected_service_ids: &[String],
    service_details: &[ServiceDetail],
    policies: &[PricingPolicy],
) -> OrderSnapshot {
    let items: Vec<OrderItemSnapshot> = service_details
        .iter()
        .filter(|service| selected_service_ids.contains(&service.id))
        .map(|service| price_item(service, policies))
        .collect();

    let total_amount = items.iter().fold(Decimal::ZERO, |acc, item| {
        acc.checked_add(item.subtotal).unwrap_or(Decimal::MAX)
    });

    let mut applied_policies: Vec<String> = Vec::new();
    for snapshot in items.iter().flat_map(|item| &item.pricing_policies) {
        if !applied_policies.contains(&snapshot.policy_name) {
            applied_policies.push(snapshot.policy_name.clone());
        }
    }

    let calculation_summary = CalculationSummary {
        total_items: items.len() as u32,
        total_quantity: items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity)),
        applied_policies,
    };

    OrderSnapshot {
        version_number: version,
        client,
        project_name: project_name.to_string(),
        items,
        total_amount,
        total_amount_rmb: render_rmb(total_amount, true),
        calculation_summary,
    }
}

fn price_item(service: &ServiceDetail, policies: &[PricingPolicy]) -> OrderItemSnapshot {
    let quantity = service.effective_quantity();
    // Saturates; inputs are bounded by validation before pricing.
    let original_price = service
        .unit_price
        .checked_mul(Decimal::from(quantity))
        .unwrap_or(Decimal::MAX);

    let matched: Vec<PricingPolicy> = policies
        .iter()
        .filter(|policy| policy.applies_to(&service.id))
        .cloned()
        .collect();
    let matched_ids: Vec<String> = matched.iter().map(|policy| policy.id.clone()).collect();

    let result = resolve(
        original_price,
        quantity,
        &service.unit,
        &matched,
        &matched_ids,
    );

    // Every matched policy is recorded with the winning calculation.
    let mut pricing_policies: Vec<PricingPolicySnapshot> = Vec::with_capacity(matched.len());
    for policy in &matched {
        if pricing_policies.iter().any(|s| s.policy_id == policy.id) {
            continue;
        }
        pricing_policies.push(PricingPolicySnapshot {
            policy_id: policy.id.clone(),
            policy_name: policy.name.clone(),
            policy_type: policy.kind.type_name().to_string(),
            discount_ratio: result.discount_ratio,
            calculation_details: result.calculation_details.clone(),
        });
    }

    let mut price_description = format!(
        "¥{}/{} × {}{}",
        format_amount(service.unit_price),
        service.unit,
        quantity,
        service.unit
    );
    if let Some(applied) = &result.applied_policy {
        price_description.push_str(&format!("（{}）", applied.name));
    }

    OrderItemSnapshot {
        service_id: service.id.clone(),
        service_name: service.name.clone(),
        category_name: service.category_name.clone(),
        unit_price: service.unit_price,
        unit: service.unit.clone(),
        quantity,
        original_price,
        discounted_price: result.discounted_price,
        discount_amount: result.discount_amount,
        subtotal: result.discounted_price,
        price_description,
        pricing_policies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::models::{PolicyKind, PolicyStatus};

    fn service(id: &str, unit_price: Decimal, quantity: Option<u32>) -> ServiceDetail {
        ServiceDetail {
            id: id.to_string(),
            name: format!("服务{id}"),
            category_name: "设计类".to_string(),
            unit_price,
            unit: "项".to_string(),
            quantity,
        }
    }

    fn uniform(id: &str, name: &str, ratio: Decimal, services: &[&str]) -> PricingPolicy {
        PricingPolicy {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            kind: PolicyKind::UniformDiscount {
                discount_ratio: ratio,
            },
            status: PolicyStatus::Active,
            service_id: None,
            selected_services: services.iter().map(|s| s.to_string()).collect(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            client_id: "c1".to_string(),
            client_name: "甲方公司".to_string(),
            contact_name: None,
            contact_phone: None,
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_service_without_policy() {
        let snapshot = build_snapshot(
            1,
            client(),
            "官网改版",
            &ids(&["s1"]),
            &[service("s1", dec!(1000), Some(3))],
            &[],
        );

        assert_eq!(snapshot.version_number, 1);
        assert_eq!(snapshot.items.len(), 1);
        let item = &snapshot.items[0];
        assert_eq!(item.original_price, dec!(3000));
        assert_eq!(item.discounted_price, dec!(3000));
        assert_eq!(item.subtotal, dec!(3000));
        assert_eq!(item.discount_amount, dec!(0));
        assert!(item.pricing_policies.is_empty());
        assert_eq!(item.price_description, "¥1,000/项 × 3项");
        assert_eq!(snapshot.total_amount, dec!(3000));
        assert_eq!(snapshot.total_amount_rmb, "人民币叁仟元整");
        assert_eq!(snapshot.calculation_summary.total_items, 1);
        assert_eq!(snapshot.calculation_summary.total_quantity, 3);
        assert!(snapshot.calculation_summary.applied_policies.is_empty());
    }

    #[test]
    fn test_filter_keeps_detail_order() {
        let details = vec![
            service("a", dec!(1), None),
            service("b", dec!(2), Some(0)),
            service("c", dec!(3), Some(2)),
        ];
        let snapshot = build_snapshot(1, client(), "p", &ids(&["c", "a"]), &details, &[]);

        let order: Vec<&str> = snapshot.items.iter().map(|i| i.service_id.as_str()).collect();
        assert_eq!(order, vec!["a", "c"]);
        assert_eq!(snapshot.items[0].quantity, 1);
        assert_eq!(snapshot.total_amount, dec!(7));
        assert_eq!(snapshot.calculation_summary.total_quantity, 3);
    }

    #[test]
    fn test_policy_matched_by_service_id_and_selection() {
        let mut by_field = uniform("p1", "九折", dec!(90), &[]);
        by_field.service_id = Some("s1".to_string());
        let by_list = uniform("p2", "七折", dec!(70), &["s1"]);
        let other = uniform("p3", "五折", dec!(50), &["s2"]);

        let snapshot = build_snapshot(
            2,
            client(),
            "p",
            &ids(&["s1"]),
            &[service("s1", dec!(100), Some(10))],
            &[by_field, by_list, other],
        );

        let item = &snapshot.items[0];
        assert_eq!(item.original_price, dec!(1000));
        assert_eq!(item.discounted_price, dec!(700));
        assert_eq!(item.price_description, "¥100/项 × 10项（七折）");

        // Both eligible policies are recorded, each with the winning
        // calculation; what-if figures per policy are not kept.
        let recorded: Vec<&str> = item
            .pricing_policies
            .iter()
            .map(|p| p.policy_id.as_str())
            .collect();
        assert_eq!(recorded, vec!["p1", "p2"]);
        for snap in &item.pricing_policies {
            assert_eq!(snap.discount_ratio, dec!(70));
            assert!(snap.calculation_details.contains("价格政策: 七折"));
        }
        assert_eq!(
            snapshot.calculation_summary.applied_policies,
            vec!["九折".to_string(), "七折".to_string()]
        );
    }

    #[test]
    fn test_duplicate_policies_recorded_once() {
        let policy = uniform("p1", "八五折", dec!(85), &["s1"]);
        let snapshot = build_snapshot(
            1,
            client(),
            "p",
            &ids(&["s1"]),
            &[service("s1", dec!(1000), Some(3))],
            &[policy.clone(), policy],
        );

        let item = &snapshot.items[0];
        assert_eq!(item.pricing_policies.len(), 1);
        assert_eq!(item.discounted_price, dec!(2550));
        assert_eq!(item.discount_amount, dec!(450));
        assert_eq!(snapshot.total_amount_rmb, "人民币贰仟伍佰伍拾元整");
    }

    #[test]
    fn test_inactive_matched_policy_still_listed() {
        let mut inactive = uniform("p1", "停用折扣", dec!(10), &["s1"]);
        inactive.status = PolicyStatus::Inactive;

        let snapshot = build_snapshot(
            1,
            client(),
            "p",
            &ids(&["s1"]),
            &[service("s1", dec!(50), Some(2))],
            &[inactive],
        );

        let item = &snapshot.items[0];
        assert_eq!(item.discounted_price, dec!(100));
        assert_eq!(item.price_description, "¥50/项 × 2项");
        assert_eq!(item.pricing_policies.len(), 1);
        assert_eq!(item.pricing_policies[0].discount_ratio, dec!(100));
    }

    #[test]
    fn test_empty_selection() {
        let snapshot = build_snapshot(
            1,
            client(),
            "p",
            &[],
            &[service("s1", dec!(10), None)],
            &[],
        );
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.total_amount, dec!(0));
        assert_eq!(snapshot.total_amount_rmb, "人民币零元整");
    }
}
