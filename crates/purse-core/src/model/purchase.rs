//! Purchase domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseState {
    /// The backend reported a state code the core does not know.
    Unspecified,
    Purchased,
    Pending,
    Canceled,
}

impl PurchaseState {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => PurchaseState::Purchased,
            2 => PurchaseState::Pending,
            3 => PurchaseState::Canceled,
            _ => PurchaseState::Unspecified,
        }
    }
}

/// Correlation identifiers the purchase was made under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentifiers {
    pub account_id: Option<String>,
    pub profile_id: Option<String>,
}

/// An in-flight subscription change waiting to take effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPurchaseUpdate {
    pub products: Vec<String>,
    pub purchase_token: String,
}

/// The backend's authoritative record of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub purchase_token: String,
    /// Product ids covered by the purchase, in backend order without duplicates.
    pub products: Vec<String>,
    pub order_id: Option<String>,
    pub package_name: String,
    /// Milliseconds since the Unix epoch.
    pub purchase_time: i64,
    pub state: PurchaseState,
    pub quantity: u32,
    pub signature: String,
    pub acknowledged: bool,
    pub auto_renewing: bool,
    pub account_identifiers: Option<AccountIdentifiers>,
    pub pending_update: Option<PendingPurchaseUpdate>,
}

impl PurchaseRecord {
    /// Purchase time as a UTC timestamp, if representable.
    pub fn purchased_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.purchase_time)
    }

    pub fn covers(&self, product_id: &str) -> bool {
        self.products.iter().any(|p| p == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_state_from_code() {
        assert_eq!(PurchaseState::from_code(1), PurchaseState::Purchased);
        assert_eq!(PurchaseState::from_code(2), PurchaseState::Pending);
        assert_eq!(PurchaseState::from_code(3), PurchaseState::Canceled);
        assert_eq!(PurchaseState::from_code(0), PurchaseState::Unspecified);
        assert_eq!(PurchaseState::from_code(42), PurchaseState::Unspecified);
    }

    #[test]
    fn test_purchased_at() {
        let record = PurchaseRecord {
            purchase_token: "tok".to_string(),
            products: vec!["p1".to_string()],
            order_id: None,
            package_name: "com.example".to_string(),
            purchase_time: 1_700_000_000_000,
            state: PurchaseState::Purchased,
            quantity: 1,
            signature: String::new(),
            acknowledged: false,
            auto_renewing: false,
            account_identifiers: None,
            pending_update: None,
        };

        assert_eq!(record.purchased_at().unwrap().timestamp(), 1_700_000_000);
        assert!(record.covers("p1"));
        assert!(!record.covers("p2"));
    }
}
