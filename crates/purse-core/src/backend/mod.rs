//! Billing backend contract.
//!
//! The backend is an opaque asynchronous service. Request methods return
//! immediately; outcomes come back later through the reply handle passed
//! with the request, or through the [`ConnectionListener`] registered on
//! connect. Only the flow launch answers synchronously.
//!
//! # Module Structure
//!
//! - `raw`: Backend-native response shapes (`RawProductDetails`, `RawPurchase`, ...)
//! - `reply`: Inbound channel types and reply handles

mod raw;
mod reply;

pub use raw::{
    RawAccountIdentifiers, RawBillingResult, RawInstallmentPlanDetails,
    RawOneTimePurchaseOfferDetails, RawPendingPurchaseUpdate, RawPricingPhase, RawPricingPhases,
    RawProductDetails, RawPurchase, RawSubscriptionOfferDetails,
};
pub use reply::{
    AcknowledgeReply, BackendCallback, CatalogReply, ConnectionListener, ConsumeReply,
    InputReceiver, InputSender, PurchasesReply, SessionInput, input_channel,
};

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionState;
use crate::flow::FlowRequest;
use crate::model::ProductKind;

/// One `(product id, kind)` pair of a catalog query batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub product_id: String,
    pub kind: ProductKind,
}

impl ProductQuery {
    pub fn new(product_id: impl Into<String>, kind: ProductKind) -> Self {
        Self {
            product_id: product_id.into(),
            kind,
        }
    }
}

/// Operations the session consumes from a billing backend.
///
/// Implementations must not block: request methods hand the work off and
/// return, completing the reply handle from whatever thread the backend
/// uses. Dropping a reply handle without completing it is reported to the
/// session as an `ERROR` result.
pub trait BillingBackend: Send + Sync {
    /// Starts connecting. Setup results, disconnects and purchase updates
    /// are delivered through `listener` for as long as the connection lives.
    fn start_connection(&self, listener: ConnectionListener);

    /// Tears the connection down.
    fn end_connection(&self);

    fn is_ready(&self) -> bool;

    /// The backend's own view of its connection.
    fn connection_state(&self) -> ConnectionState;

    fn query_product_details(&self, products: Vec<ProductQuery>, reply: CatalogReply);

    fn query_purchases(&self, kind: ProductKind, reply: PurchasesReply);

    /// Hands the request to the checkout UI and returns the submission result.
    fn launch_billing_flow(&self, request: &FlowRequest) -> RawBillingResult;

    fn acknowledge_purchase(&self, reply: AcknowledgeReply);

    fn consume_purchase(&self, reply: ConsumeReply);
}
