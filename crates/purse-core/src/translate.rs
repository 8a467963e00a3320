//! Result translator.
//!
//! The only place that reads backend-native shapes. Malformed records are
//! dropped with a warning instead of failing the batch they arrived in.

use crate::backend::{
    RawAccountIdentifiers, RawBillingResult, RawInstallmentPlanDetails,
    RawOneTimePurchaseOfferDetails, RawPendingPurchaseUpdate, RawPricingPhase, RawProductDetails,
    RawPurchase, RawSubscriptionOfferDetails,
};
use crate::model::{
    AccountIdentifiers, CatalogEntry, InstallmentPlan, OneTimeOffer, OperationResult,
    PendingPurchaseUpdate, PricingPhase, ProductKind, PurchaseRecord, PurchaseState,
    RecurrenceMode, SubscriptionOffer,
};

pub fn operation_result(raw: &RawBillingResult) -> OperationResult {
    OperationResult::new(
        raw.response_code,
        raw.debug_message.clone().unwrap_or_default(),
    )
}

/// Converts a catalog payload. A missing list yields an empty one.
pub fn catalog_entries(raw: Option<Vec<RawProductDetails>>) -> Vec<CatalogEntry> {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(catalog_entry)
        .collect()
}

pub fn catalog_entry(raw: RawProductDetails) -> Option<CatalogEntry> {
    if raw.product_id.is_empty() {
        tracing::warn!("[Translator] Dropping catalog entry without product id");
        return None;
    }

    let Some(kind) = ProductKind::from_wire(&raw.product_type) else {
        tracing::warn!(
            "[Translator] Dropping catalog entry {}: unknown product type '{}'",
            raw.product_id,
            raw.product_type
        );
        return None;
    };

    let subscription_offers = match kind {
        ProductKind::Subscription => raw
            .subscription_offer_details
            .unwrap_or_default()
            .into_iter()
            .filter_map(|offer| subscription_offer(&raw.product_id, offer))
            .collect(),
        ProductKind::OneTime => Vec::new(),
    };

    Some(CatalogEntry {
        product_id: raw.product_id,
        name: raw.name,
        title: raw.title,
        description: raw.description,
        kind,
        one_time_offer: raw.one_time_purchase_offer_details.map(one_time_offer),
        subscription_offers,
    })
}

fn one_time_offer(raw: RawOneTimePurchaseOfferDetails) -> OneTimeOffer {
    OneTimeOffer {
        formatted_price: raw.formatted_price,
        price_amount_micros: raw.price_amount_micros,
        price_currency_code: raw.price_currency_code,
    }
}

fn subscription_offer(product_id: &str, raw: RawSubscriptionOfferDetails) -> Option<SubscriptionOffer> {
    if raw.offer_token.is_empty() {
        tracing::warn!(
            "[Translator] Dropping offer {} on {}: missing offer token",
            raw.base_plan_id,
            product_id
        );
        return None;
    }

    Some(SubscriptionOffer {
        base_plan_id: raw.base_plan_id,
        offer_id: raw.offer_id.filter(|id| !id.is_empty()),
        offer_token: raw.offer_token,
        installment_plan: raw.installment_plan_details.map(installment_plan),
        pricing_phases: raw
            .pricing_phases
            .pricing_phase_list
            .unwrap_or_default()
            .into_iter()
            .map(|phase| pricing_phase(product_id, phase))
            .collect(),
        offer_tags: raw.offer_tags.into_iter().collect(),
    })
}

fn installment_plan(raw: RawInstallmentPlanDetails) -> InstallmentPlan {
    InstallmentPlan {
        commitment_payments_count: non_negative(raw.installment_plan_commitment_payments_count),
        subsequent_commitment_payments_count: non_negative(
            raw.subsequent_installment_plan_commitment_payments_count,
        ),
    }
}

fn pricing_phase(product_id: &str, raw: RawPricingPhase) -> PricingPhase {
    let recurrence_mode = RecurrenceMode::from_code(raw.recurrence_mode);
    if recurrence_mode == RecurrenceMode::Unspecified {
        tracing::warn!(
            "[Translator] Pricing phase on {} has unknown recurrence mode {}",
            product_id,
            raw.recurrence_mode
        );
    }

    PricingPhase {
        billing_period: raw.billing_period,
        billing_cycle_count: non_negative(raw.billing_cycle_count),
        formatted_price: raw.formatted_price,
        price_amount_micros: raw.price_amount_micros,
        price_currency_code: raw.price_currency_code,
        recurrence_mode,
    }
}

/// Converts a purchase payload. A missing list yields an empty one.
pub fn purchase_records(raw: Option<Vec<RawPurchase>>) -> Vec<PurchaseRecord> {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(purchase_record)
        .collect()
}

pub fn purchase_record(raw: RawPurchase) -> Option<PurchaseRecord> {
    if raw.purchase_token.is_empty() {
        tracing::warn!(
            "[Translator] Dropping purchase without token (order {:?})",
            raw.order_id
        );
        return None;
    }

    Some(PurchaseRecord {
        purchase_token: raw.purchase_token,
        products: dedup_in_order(raw.products),
        order_id: raw.order_id.filter(|id| !id.is_empty()),
        package_name: raw.package_name,
        purchase_time: raw.purchase_time,
        state: PurchaseState::from_code(raw.purchase_state),
        quantity: non_negative(raw.quantity),
        signature: raw.signature,
        acknowledged: raw.is_acknowledged,
        auto_renewing: raw.is_auto_renewing,
        account_identifiers: raw.account_identifiers.and_then(account_identifiers),
        pending_update: raw.pending_purchase_update.and_then(pending_update),
    })
}

fn account_identifiers(raw: RawAccountIdentifiers) -> Option<AccountIdentifiers> {
    let account_id = raw.obfuscated_account_id.filter(|id| !id.is_empty());
    let profile_id = raw.obfuscated_profile_id.filter(|id| !id.is_empty());

    if account_id.is_none() && profile_id.is_none() {
        return None;
    }

    Some(AccountIdentifiers {
        account_id,
        profile_id,
    })
}

fn pending_update(raw: RawPendingPurchaseUpdate) -> Option<PendingPurchaseUpdate> {
    if raw.purchase_token.is_empty() && raw.products.is_empty() {
        return None;
    }

    Some(PendingPurchaseUpdate {
        products: dedup_in_order(raw.products),
        purchase_token: raw.purchase_token,
    })
}

fn dedup_in_order(values: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(values.len());
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RawPricingPhases;
    use crate::model::ResponseCode;

    fn raw_subscription() -> RawProductDetails {
        RawProductDetails {
            product_id: "sub1".to_string(),
            product_type: "subs".to_string(),
            name: "Premium".to_string(),
            title: "Premium (Example)".to_string(),
            description: "All features".to_string(),
            one_time_purchase_offer_details: None,
            subscription_offer_details: Some(vec![
                RawSubscriptionOfferDetails {
                    base_plan_id: "monthly".to_string(),
                    offer_token: "tokA".to_string(),
                    offer_tags: vec!["intro".to_string(), "intro".to_string()],
                    pricing_phases: RawPricingPhases {
                        pricing_phase_list: Some(vec![RawPricingPhase {
                            billing_period: "P1M".to_string(),
                            billing_cycle_count: 0,
                            formatted_price: "$4.99".to_string(),
                            price_amount_micros: 4_990_000,
                            price_currency_code: "USD".to_string(),
                            recurrence_mode: 1,
                        }]),
                    },
                    ..Default::default()
                },
                RawSubscriptionOfferDetails {
                    base_plan_id: "broken".to_string(),
                    offer_token: String::new(),
                    ..Default::default()
                },
            ]),
        }
    }

    #[test]
    fn test_operation_result_defaults_missing_message() {
        let result = operation_result(&RawBillingResult::ok());
        assert_eq!(result, OperationResult::new(ResponseCode::OK, ""));
    }

    #[test]
    fn test_subscription_entry_keeps_only_tokened_offers() {
        let entry = catalog_entry(raw_subscription()).unwrap();

        assert_eq!(entry.kind, ProductKind::Subscription);
        assert!(entry.one_time_offer.is_none());
        assert_eq!(entry.subscription_offers.len(), 1);

        let offer = &entry.subscription_offers[0];
        assert_eq!(offer.offer_token, "tokA");
        assert_eq!(offer.offer_tags.len(), 1);
        assert_eq!(offer.pricing_phases[0].recurrence_mode, RecurrenceMode::Infinite);
        assert_eq!(offer.pricing_phases[0].billing_cycle_count, 0);
    }

    #[test]
    fn test_unknown_recurrence_mode_keeps_phase() {
        let mut raw = raw_subscription();
        let offers = raw.subscription_offer_details.as_mut().unwrap();
        let phases = offers[0].pricing_phases.pricing_phase_list.as_mut().unwrap();
        phases.push(RawPricingPhase {
            billing_period: "P1Y".to_string(),
            formatted_price: "$49.99".to_string(),
            price_amount_micros: 49_990_000,
            price_currency_code: "USD".to_string(),
            recurrence_mode: 9,
            ..Default::default()
        });

        let entry = catalog_entry(raw).unwrap();
        let phases = &entry.subscription_offers[0].pricing_phases;

        assert_eq!(phases.len(), 2);
        assert_eq!(phases[1].recurrence_mode, RecurrenceMode::Unspecified);
        assert_eq!(phases[1].formatted_price, "$49.99");
    }

    #[test]
    fn test_one_time_entry_ignores_offer_list() {
        let mut raw = raw_subscription();
        raw.product_type = "inapp".to_string();
        raw.one_time_purchase_offer_details = Some(RawOneTimePurchaseOfferDetails {
            formatted_price: "$0.99".to_string(),
            price_amount_micros: 990_000,
            price_currency_code: "USD".to_string(),
        });

        let entry = catalog_entry(raw).unwrap();
        assert_eq!(entry.kind, ProductKind::OneTime);
        assert!(entry.subscription_offers.is_empty());
        assert_eq!(entry.one_time_offer.unwrap().price_amount_micros, 990_000);
    }

    #[test]
    fn test_malformed_catalog_entries_are_skipped() {
        let mut no_id = raw_subscription();
        no_id.product_id.clear();
        let mut bad_type = raw_subscription();
        bad_type.product_type = "bundle".to_string();

        let entries = catalog_entries(Some(vec![no_id, bad_type, raw_subscription()]));
        assert_eq!(entries.len(), 1);
        assert!(catalog_entries(None).is_empty());
    }

    #[test]
    fn test_purchase_record_translation() {
        let raw = RawPurchase {
            purchase_token: "ptok".to_string(),
            products: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            order_id: Some(String::new()),
            package_name: "com.example".to_string(),
            purchase_state: 2,
            purchase_time: 1_000,
            quantity: -1,
            signature: "sig".to_string(),
            is_acknowledged: true,
            is_auto_renewing: false,
            account_identifiers: Some(RawAccountIdentifiers {
                obfuscated_account_id: Some("acct".to_string()),
                obfuscated_profile_id: None,
            }),
            pending_purchase_update: Some(RawPendingPurchaseUpdate::default()),
        };

        let record = purchase_record(raw).unwrap();
        assert_eq!(record.products, vec!["a".to_string(), "b".to_string()]);
        assert!(record.order_id.is_none());
        assert_eq!(record.state, PurchaseState::Pending);
        assert_eq!(record.quantity, 0);
        assert_eq!(
            record.account_identifiers.unwrap().account_id.as_deref(),
            Some("acct")
        );
        assert!(record.pending_update.is_none());
    }

    #[test]
    fn test_purchase_without_token_is_skipped() {
        let records = purchase_records(Some(vec![RawPurchase::default()]));
        assert!(records.is_empty());
    }
}
