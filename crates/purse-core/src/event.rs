use serde::{Deserialize, Serialize};

use crate::model::{CatalogEntry, OperationResult, PurchaseRecord};

/// Events emitted to the caller, one per handled callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BillingEvent {
    /// The backend dropped the connection on its own.
    ConnectionLost,
    /// Connection setup finished, successfully or not.
    ConnectionReady { result: OperationResult },
    CatalogQueryCompleted {
        result: OperationResult,
        entries: Vec<CatalogEntry>,
    },
    PurchaseQueryCompleted {
        result: OperationResult,
        purchases: Vec<PurchaseRecord>,
    },
    /// Flow outcomes and unsolicited renewals or cancellations.
    PurchasesUpdated {
        result: OperationResult,
        purchases: Vec<PurchaseRecord>,
    },
    AcknowledgeCompleted {
        result: OperationResult,
        purchase_token: String,
    },
    ConsumeCompleted {
        result: OperationResult,
        purchase_token: String,
    },
    /// The host resumed while connected; entitlements may need re-checking.
    SessionResumed,
}

impl BillingEvent {
    /// The serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            BillingEvent::ConnectionLost => "connection_lost",
            BillingEvent::ConnectionReady { .. } => "connection_ready",
            BillingEvent::CatalogQueryCompleted { .. } => "catalog_query_completed",
            BillingEvent::PurchaseQueryCompleted { .. } => "purchase_query_completed",
            BillingEvent::PurchasesUpdated { .. } => "purchases_updated",
            BillingEvent::AcknowledgeCompleted { .. } => "acknowledge_completed",
            BillingEvent::ConsumeCompleted { .. } => "consume_completed",
            BillingEvent::SessionResumed => "session_resumed",
        }
    }

    /// The backend result carried by the event, if any.
    pub fn result(&self) -> Option<&OperationResult> {
        match self {
            BillingEvent::ConnectionReady { result }
            | BillingEvent::CatalogQueryCompleted { result, .. }
            | BillingEvent::PurchaseQueryCompleted { result, .. }
            | BillingEvent::PurchasesUpdated { result, .. }
            | BillingEvent::AcknowledgeCompleted { result, .. }
            | BillingEvent::ConsumeCompleted { result, .. } => Some(result),
            BillingEvent::ConnectionLost | BillingEvent::SessionResumed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_serialized_tag() {
        let events = vec![
            BillingEvent::ConnectionLost,
            BillingEvent::ConnectionReady {
                result: OperationResult::ok(),
            },
            BillingEvent::CatalogQueryCompleted {
                result: OperationResult::ok(),
                entries: Vec::new(),
            },
            BillingEvent::PurchaseQueryCompleted {
                result: OperationResult::ok(),
                purchases: Vec::new(),
            },
            BillingEvent::PurchasesUpdated {
                result: OperationResult::ok(),
                purchases: Vec::new(),
            },
            BillingEvent::AcknowledgeCompleted {
                result: OperationResult::ok(),
                purchase_token: "t".to_string(),
            },
            BillingEvent::ConsumeCompleted {
                result: OperationResult::ok(),
                purchase_token: "t".to_string(),
            },
            BillingEvent::SessionResumed,
        ];

        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.name());
        }
    }

    #[test]
    fn test_acknowledge_event_json_shape() {
        let event = BillingEvent::AcknowledgeCompleted {
            result: OperationResult::new(8, "not owned"),
            purchase_token: "tok".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["result"]["status_code"], 8);
        assert_eq!(json["purchase_token"], "tok");
        assert!(event.result().is_some());
        assert!(BillingEvent::SessionResumed.result().is_none());
    }
}
