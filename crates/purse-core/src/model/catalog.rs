//! Catalog domain models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PurseError;

/// Whether a product is bought once or subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    OneTime,
    Subscription,
}

impl ProductKind {
    /// The backend's wire name for this kind.
    pub fn as_wire(&self) -> &'static str {
        match self {
            ProductKind::OneTime => "inapp",
            ProductKind::Subscription => "subs",
        }
    }

    /// Parses a backend wire name.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "inapp" => Some(ProductKind::OneTime),
            "subs" => Some(ProductKind::Subscription),
            _ => None,
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for ProductKind {
    type Err = PurseError;

    /// Accepts both wire names and the snake_case enum names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_time" => Ok(ProductKind::OneTime),
            "subscription" => Ok(ProductKind::Subscription),
            other => ProductKind::from_wire(other)
                .ok_or_else(|| PurseError::malformed(format!("unknown product kind '{other}'"))),
        }
    }
}

/// How a pricing phase repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceMode {
    /// The backend reported a recurrence code the core does not know.
    Unspecified,
    Infinite,
    Finite,
    NonRecurring,
}

impl RecurrenceMode {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => RecurrenceMode::Infinite,
            2 => RecurrenceMode::Finite,
            3 => RecurrenceMode::NonRecurring,
            _ => RecurrenceMode::Unspecified,
        }
    }
}

/// Pricing of a one-time product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeOffer {
    pub formatted_price: String,
    pub price_amount_micros: i64,
    pub price_currency_code: String,
}

/// Installment commitment attached to a subscription offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub commitment_payments_count: u32,
    pub subsequent_commitment_payments_count: u32,
}

/// One billing phase of a subscription offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPhase {
    /// ISO-8601 duration, e.g. `P1M`.
    pub billing_period: String,
    /// Number of cycles; 0 means the phase repeats forever.
    pub billing_cycle_count: u32,
    pub formatted_price: String,
    pub price_amount_micros: i64,
    pub price_currency_code: String,
    pub recurrence_mode: RecurrenceMode,
}

/// A subscription pricing variant (base plan plus optional promotion).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionOffer {
    pub base_plan_id: String,
    pub offer_id: Option<String>,
    /// Opaque handle the backend needs to launch a purchase of this offer.
    pub offer_token: String,
    pub installment_plan: Option<InstallmentPlan>,
    pub pricing_phases: Vec<PricingPhase>,
    pub offer_tags: BTreeSet<String>,
}

/// A purchasable product as reported by the backend at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub product_id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub kind: ProductKind,
    /// Absent for subscriptions and for one-time products the backend did not price.
    pub one_time_offer: Option<OneTimeOffer>,
    /// Empty for one-time products.
    pub subscription_offers: Vec<SubscriptionOffer>,
}

impl CatalogEntry {
    /// Returns the first offer whose base plan matches.
    pub fn offer_for_base_plan(&self, base_plan_id: &str) -> Option<&SubscriptionOffer> {
        self.subscription_offers
            .iter()
            .find(|offer| offer.base_plan_id == base_plan_id)
    }

    pub fn is_subscription(&self) -> bool {
        self.kind == ProductKind::Subscription
    }
}
