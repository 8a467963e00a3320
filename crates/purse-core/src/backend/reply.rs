//! Inbound callback channel and per-request reply handles.
//!
//! Every signal that can change session state travels as a [`SessionInput`]
//! over one unbounded channel, so the consumer sees them in arrival order.
//! Backends never touch the channel directly: they get a [`ConnectionListener`]
//! for lifecycle and unsolicited updates, and a move-only reply handle per
//! request that must be completed exactly once.

use tokio::sync::mpsc;

use super::raw::{RawBillingResult, RawProductDetails, RawPurchase};
use crate::connection::ConnectAttempt;
use crate::model::ProductKind;

/// Callback payloads as delivered by the backend, before translation.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCallback {
    SetupFinished {
        attempt: ConnectAttempt,
        result: RawBillingResult,
    },
    ServiceDisconnected,
    ProductDetails {
        result: RawBillingResult,
        products: Option<Vec<RawProductDetails>>,
    },
    PurchasesQueried {
        result: RawBillingResult,
        purchases: Option<Vec<RawPurchase>>,
    },
    PurchasesUpdated {
        result: RawBillingResult,
        purchases: Option<Vec<RawPurchase>>,
    },
    Acknowledged {
        result: RawBillingResult,
        purchase_token: String,
    },
    Consumed {
        result: RawBillingResult,
        purchase_token: String,
    },
}

/// Anything the session's control point consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Backend(BackendCallback),
    /// The host process came back to the foreground.
    Resumed,
}

pub type InputSender = mpsc::UnboundedSender<SessionInput>;
pub type InputReceiver = mpsc::UnboundedReceiver<SessionInput>;

/// Creates the inbound channel.
pub fn input_channel() -> (InputSender, InputReceiver) {
    mpsc::unbounded_channel()
}

fn deliver(tx: &InputSender, callback: BackendCallback) {
    if tx.send(SessionInput::Backend(callback)).is_err() {
        tracing::debug!("[Backend] Session dropped, discarding callback");
    }
}

/// Long-lived listener handed to the backend when connecting.
///
/// Each listener is bound to the connect attempt that created it, so a setup
/// result from an abandoned attempt can be told apart from the live one.
#[derive(Debug, Clone)]
pub struct ConnectionListener {
    tx: InputSender,
    attempt: ConnectAttempt,
}

impl ConnectionListener {
    pub fn new(tx: InputSender, attempt: ConnectAttempt) -> Self {
        Self { tx, attempt }
    }

    pub fn attempt(&self) -> ConnectAttempt {
        self.attempt
    }

    pub fn setup_finished(&self, result: RawBillingResult) {
        deliver(
            &self.tx,
            BackendCallback::SetupFinished {
                attempt: self.attempt,
                result,
            },
        );
    }

    pub fn service_disconnected(&self) {
        deliver(&self.tx, BackendCallback::ServiceDisconnected);
    }

    /// Flow outcomes, renewals and cancellations all arrive here.
    pub fn purchases_updated(&self, result: RawBillingResult, purchases: Option<Vec<RawPurchase>>) {
        deliver(&self.tx, BackendCallback::PurchasesUpdated { result, purchases });
    }
}

/// One-shot slot shared by the reply handles.
#[derive(Debug)]
struct Pending {
    tx: Option<InputSender>,
}

impl Pending {
    fn new(tx: InputSender) -> Self {
        Self { tx: Some(tx) }
    }

    fn send(&mut self, callback: BackendCallback) {
        if let Some(tx) = self.tx.take() {
            deliver(&tx, callback);
        }
    }

    fn is_open(&self) -> bool {
        self.tx.is_some()
    }
}

/// Reply to a catalog query.
#[derive(Debug)]
pub struct CatalogReply {
    pending: Pending,
}

impl CatalogReply {
    pub fn new(tx: InputSender) -> Self {
        Self {
            pending: Pending::new(tx),
        }
    }

    pub fn complete(mut self, result: RawBillingResult, products: Option<Vec<RawProductDetails>>) {
        self.pending
            .send(BackendCallback::ProductDetails { result, products });
    }
}

impl Drop for CatalogReply {
    fn drop(&mut self) {
        if self.pending.is_open() {
            tracing::warn!("[Backend] Catalog query reply dropped without completion");
            self.pending.send(BackendCallback::ProductDetails {
                result: RawBillingResult::abandoned(),
                products: None,
            });
        }
    }
}

/// Reply to a purchase query.
#[derive(Debug)]
pub struct PurchasesReply {
    pending: Pending,
    kind: ProductKind,
}

impl PurchasesReply {
    pub fn new(tx: InputSender, kind: ProductKind) -> Self {
        Self {
            pending: Pending::new(tx),
            kind,
        }
    }

    /// The product kind the query was scoped to.
    pub fn kind(&self) -> ProductKind {
        self.kind
    }

    pub fn complete(mut self, result: RawBillingResult, purchases: Option<Vec<RawPurchase>>) {
        self.pending
            .send(BackendCallback::PurchasesQueried { result, purchases });
    }
}

impl Drop for PurchasesReply {
    fn drop(&mut self) {
        if self.pending.is_open() {
            tracing::warn!(
                "[Backend] Purchase query reply ({}) dropped without completion",
                self.kind
            );
            self.pending.send(BackendCallback::PurchasesQueried {
                result: RawBillingResult::abandoned(),
                purchases: None,
            });
        }
    }
}

/// Reply to an acknowledge request. Owns the token it was issued for.
#[derive(Debug)]
pub struct AcknowledgeReply {
    pending: Pending,
    purchase_token: String,
}

impl AcknowledgeReply {
    pub fn new(tx: InputSender, purchase_token: impl Into<String>) -> Self {
        Self {
            pending: Pending::new(tx),
            purchase_token: purchase_token.into(),
        }
    }

    pub fn purchase_token(&self) -> &str {
        &self.purchase_token
    }

    pub fn complete(mut self, result: RawBillingResult) {
        let purchase_token = std::mem::take(&mut self.purchase_token);
        self.pending.send(BackendCallback::Acknowledged {
            result,
            purchase_token,
        });
    }
}

impl Drop for AcknowledgeReply {
    fn drop(&mut self) {
        if self.pending.is_open() {
            tracing::warn!(
                "[Backend] Acknowledge reply for {} dropped without completion",
                self.purchase_token
            );
            let purchase_token = std::mem::take(&mut self.purchase_token);
            self.pending.send(BackendCallback::Acknowledged {
                result: RawBillingResult::abandoned(),
                purchase_token,
            });
        }
    }
}

/// Reply to a consume request. Owns the token it was issued for.
#[derive(Debug)]
pub struct ConsumeReply {
    pending: Pending,
    purchase_token: String,
}

impl ConsumeReply {
    pub fn new(tx: InputSender, purchase_token: impl Into<String>) -> Self {
        Self {
            pending: Pending::new(tx),
            purchase_token: purchase_token.into(),
        }
    }

    pub fn purchase_token(&self) -> &str {
        &self.purchase_token
    }

    pub fn complete(mut self, result: RawBillingResult) {
        let purchase_token = std::mem::take(&mut self.purchase_token);
        self.pending.send(BackendCallback::Consumed {
            result,
            purchase_token,
        });
    }
}

impl Drop for ConsumeReply {
    fn drop(&mut self) {
        if self.pending.is_open() {
            tracing::warn!(
                "[Backend] Consume reply for {} dropped without completion",
                self.purchase_token
            );
            let purchase_token = std::mem::take(&mut self.purchase_token);
            self.pending.send(BackendCallback::Consumed {
                result: RawBillingResult::abandoned(),
                purchase_token,
            });
        }
    }
}
