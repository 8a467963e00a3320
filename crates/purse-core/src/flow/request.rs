use serde::{Deserialize, Serialize};

use crate::model::CatalogEntry;

/// How an existing subscription is replaced by the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementMode {
    Unknown,
    WithTimeProration,
    ChargeProratedPrice,
    WithoutProration,
    ChargeFullPrice,
    Deferred,
}

impl ReplacementMode {
    pub fn code(&self) -> i32 {
        match self {
            ReplacementMode::Unknown => 0,
            ReplacementMode::WithTimeProration => 1,
            ReplacementMode::ChargeProratedPrice => 2,
            ReplacementMode::WithoutProration => 3,
            ReplacementMode::ChargeFullPrice => 5,
            ReplacementMode::Deferred => 6,
        }
    }

    /// Maps a backend code; unrecognized codes become `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ReplacementMode::WithTimeProration,
            2 => ReplacementMode::ChargeProratedPrice,
            3 => ReplacementMode::WithoutProration,
            5 => ReplacementMode::ChargeFullPrice,
            6 => ReplacementMode::Deferred,
            _ => ReplacementMode::Unknown,
        }
    }
}

/// One product line of a flow request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFlowParams {
    /// The cached entry being purchased.
    pub product: CatalogEntry,
    /// Token of the selected offer; only set for subscriptions.
    pub offer_token: Option<String>,
}

/// Parameters for replacing an existing subscription.
///
/// The two shapes are mutually exclusive: a non-empty external transaction id
/// selects `ExternalTransaction`, anything else `OldTokenOnly`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SubscriptionUpdate {
    OldTokenOnly {
        old_purchase_token: String,
        replacement_mode: ReplacementMode,
    },
    ExternalTransaction {
        old_purchase_token: String,
        external_transaction_id: String,
        replacement_mode: ReplacementMode,
    },
}

impl SubscriptionUpdate {
    pub fn old_purchase_token(&self) -> &str {
        match self {
            SubscriptionUpdate::OldTokenOnly {
                old_purchase_token, ..
            }
            | SubscriptionUpdate::ExternalTransaction {
                old_purchase_token, ..
            } => old_purchase_token,
        }
    }

    pub fn replacement_mode(&self) -> ReplacementMode {
        match self {
            SubscriptionUpdate::OldTokenOnly {
                replacement_mode, ..
            }
            | SubscriptionUpdate::ExternalTransaction {
                replacement_mode, ..
            } => *replacement_mode,
        }
    }
}

/// Everything the backend needs to open its checkout UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRequest {
    pub products: Vec<ProductFlowParams>,
    pub subscription_update: Option<SubscriptionUpdate>,
    pub account_id: Option<String>,
    pub profile_id: Option<String>,
    pub offer_personalized: bool,
}

impl FlowRequest {
    /// Product ids in request order.
    pub fn product_ids(&self) -> Vec<&str> {
        self.products
            .iter()
            .map(|p| p.product.product_id.as_str())
            .collect()
    }
}
