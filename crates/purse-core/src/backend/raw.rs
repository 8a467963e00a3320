//! Backend-native response shapes.
//!
//! These mirror what a billing backend hands back: nullable lists, integer
//! codes, wire strings. Only [`crate::translate`] reads them; everything
//! else in the workspace works with [`crate::model`].

use serde::{Deserialize, Serialize};

use crate::model::ResponseCode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBillingResult {
    pub response_code: i32,
    #[serde(default)]
    pub debug_message: Option<String>,
}

impl RawBillingResult {
    pub fn new(response_code: i32, debug_message: impl Into<String>) -> Self {
        Self {
            response_code,
            debug_message: Some(debug_message.into()),
        }
    }

    pub fn ok() -> Self {
        Self {
            response_code: ResponseCode::OK,
            debug_message: None,
        }
    }

    /// Result delivered for a request whose reply handle was dropped unanswered.
    pub fn abandoned() -> Self {
        Self::new(
            ResponseCode::ERROR,
            "backend dropped the request without responding",
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOneTimePurchaseOfferDetails {
    pub formatted_price: String,
    pub price_amount_micros: i64,
    pub price_currency_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInstallmentPlanDetails {
    pub installment_plan_commitment_payments_count: i32,
    pub subsequent_installment_plan_commitment_payments_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPricingPhase {
    pub billing_period: String,
    pub billing_cycle_count: i32,
    pub formatted_price: String,
    pub price_amount_micros: i64,
    pub price_currency_code: String,
    pub recurrence_mode: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPricingPhases {
    pub pricing_phase_list: Option<Vec<RawPricingPhase>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSubscriptionOfferDetails {
    pub base_plan_id: String,
    pub offer_id: Option<String>,
    pub offer_tags: Vec<String>,
    pub offer_token: String,
    pub installment_plan_details: Option<RawInstallmentPlanDetails>,
    pub pricing_phases: RawPricingPhases,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProductDetails {
    pub product_id: String,
    /// `"inapp"` or `"subs"`.
    pub product_type: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub one_time_purchase_offer_details: Option<RawOneTimePurchaseOfferDetails>,
    pub subscription_offer_details: Option<Vec<RawSubscriptionOfferDetails>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAccountIdentifiers {
    pub obfuscated_account_id: Option<String>,
    pub obfuscated_profile_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPendingPurchaseUpdate {
    pub products: Vec<String>,
    pub purchase_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPurchase {
    pub purchase_token: String,
    pub products: Vec<String>,
    pub order_id: Option<String>,
    pub package_name: String,
    pub purchase_state: i32,
    pub purchase_time: i64,
    pub quantity: i32,
    pub signature: String,
    pub is_acknowledged: bool,
    pub is_auto_renewing: bool,
    pub account_identifiers: Option<RawAccountIdentifiers>,
    pub pending_purchase_update: Option<RawPendingPurchaseUpdate>,
}
