use super::fixture::{OwnedPurchase, SandboxFixture};
use purse_core::backend::{
    AcknowledgeReply, CatalogReply, ConnectionListener, ConsumeReply, ProductQuery,
    PurchasesReply, RawAccountIdentifiers, RawBillingResult, RawPurchase,
};
use purse_core::flow::FlowRequest;
use purse_core::model::{ProductKind, ResponseCode};
use purse_core::{BillingBackend, ConnectionState};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

const PURCHASED: i32 = 1;

/// In-process billing backend driven by a [`SandboxFixture`].
///
/// Replies are completed before the request method returns. The session
/// still only observes them once its dispatcher drains the inbound channel,
/// so the asynchronous contract holds.
pub struct SandboxBackend {
    fixture: SandboxFixture,
    store: Mutex<SandboxStore>,
}

#[derive(Default)]
struct SandboxStore {
    state: ConnectionState,
    listener: Option<ConnectionListener>,
    owned: Vec<OwnedPurchase>,
}

impl SandboxBackend {
    pub fn new(fixture: SandboxFixture) -> Self {
        let store = SandboxStore {
            owned: fixture.purchases.clone(),
            ..Default::default()
        };
        Self {
            fixture,
            store: Mutex::new(store),
        }
    }

    /// Purchases the sandbox currently considers owned.
    pub fn owned_purchases(&self) -> Vec<RawPurchase> {
        self.store()
            .owned
            .iter()
            .map(|owned| owned.purchase.clone())
            .collect()
    }

    fn store(&self) -> MutexGuard<'_, SandboxStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mint_purchase(&self, request: &FlowRequest, kind: ProductKind) -> RawPurchase {
        let account_identifiers = (request.account_id.is_some() || request.profile_id.is_some())
            .then(|| RawAccountIdentifiers {
                obfuscated_account_id: request.account_id.clone(),
                obfuscated_profile_id: request.profile_id.clone(),
            });

        RawPurchase {
            purchase_token: Uuid::new_v4().to_string(),
            products: request.product_ids().into_iter().map(String::from).collect(),
            order_id: Some(format!("SANDBOX.{}", Uuid::new_v4())),
            package_name: self.fixture.package_name.clone(),
            purchase_state: PURCHASED,
            purchase_time: chrono::Utc::now().timestamp_millis(),
            quantity: 1,
            signature: "sandbox".to_string(),
            is_acknowledged: false,
            is_auto_renewing: kind == ProductKind::Subscription,
            account_identifiers,
            pending_purchase_update: None,
        }
    }

    /// Checks a flow request against the fixture and the owned purchases.
    fn validate_flow(
        &self,
        store: &SandboxStore,
        request: &FlowRequest,
    ) -> Result<ProductKind, RawBillingResult> {
        let mut kind = None;

        for product_id in request.product_ids() {
            let Some(product_kind) = self.fixture.product_kind(product_id) else {
                return Err(RawBillingResult::new(
                    ResponseCode::ITEM_UNAVAILABLE,
                    format!("Unknown product '{}'", product_id),
                ));
            };

            let owned = store
                .owned
                .iter()
                .any(|o| o.purchase.products.iter().any(|p| p == product_id));
            if owned && request.subscription_update.is_none() {
                return Err(RawBillingResult::new(
                    ResponseCode::ITEM_ALREADY_OWNED,
                    format!("'{}' is already owned", product_id),
                ));
            }

            kind.get_or_insert(product_kind);
        }

        kind.ok_or_else(|| {
            RawBillingResult::new(ResponseCode::DEVELOPER_ERROR, "Flow request has no products")
        })
    }
}

impl BillingBackend for SandboxBackend {
    fn start_connection(&self, listener: ConnectionListener) {
        let result = if self.fixture.fail_connect {
            RawBillingResult::new(ResponseCode::BILLING_UNAVAILABLE, "Sandbox billing unavailable")
        } else {
            RawBillingResult::ok()
        };

        {
            let mut store = self.store();
            if self.fixture.fail_connect {
                store.state = ConnectionState::Disconnected;
                store.listener = None;
            } else {
                store.state = ConnectionState::Connected;
                store.listener = Some(listener.clone());
            }
        }

        tracing::debug!("[Sandbox] Setup finished ({})", result.response_code);
        listener.setup_finished(result);
    }

    fn end_connection(&self) {
        let mut store = self.store();
        store.state = ConnectionState::Disconnected;
        store.listener = None;
        tracing::debug!("[Sandbox] Connection ended");
    }

    fn is_ready(&self) -> bool {
        self.store().state == ConnectionState::Connected
    }

    fn connection_state(&self) -> ConnectionState {
        self.store().state
    }

    fn query_product_details(&self, products: Vec<ProductQuery>, reply: CatalogReply) {
        if !self.is_ready() {
            reply.complete(disconnected(), None);
            return;
        }

        let matched: Vec<_> = self
            .fixture
            .products
            .iter()
            .filter(|p| {
                products
                    .iter()
                    .any(|q| q.product_id == p.product_id && q.kind.as_wire() == p.product_type)
            })
            .cloned()
            .collect();

        tracing::debug!(
            "[Sandbox] Catalog query for {} products matched {}",
            products.len(),
            matched.len()
        );
        reply.complete(RawBillingResult::ok(), Some(matched));
    }

    fn query_purchases(&self, kind: ProductKind, reply: PurchasesReply) {
        if !self.is_ready() {
            reply.complete(disconnected(), None);
            return;
        }

        let purchases: Vec<_> = self
            .store()
            .owned
            .iter()
            .filter(|o| o.kind == kind)
            .map(|o| o.purchase.clone())
            .collect();

        reply.complete(RawBillingResult::ok(), Some(purchases));
    }

    fn launch_billing_flow(&self, request: &FlowRequest) -> RawBillingResult {
        let (listener, purchase) = {
            let mut store = self.store();
            let Some(listener) = store.listener.clone() else {
                return disconnected();
            };

            let kind = match self.validate_flow(&store, request) {
                Ok(kind) => kind,
                Err(result) => {
                    tracing::debug!("[Sandbox] Flow rejected: {:?}", result.debug_message);
                    return result;
                }
            };

            if let Some(update) = &request.subscription_update {
                store
                    .owned
                    .retain(|o| o.purchase.purchase_token != update.old_purchase_token());
            }

            let purchase = self.mint_purchase(request, kind);
            store.owned.push(OwnedPurchase {
                kind,
                purchase: purchase.clone(),
            });
            (listener, purchase)
        };

        tracing::debug!("[Sandbox] Minted purchase {}", purchase.purchase_token);
        listener.purchases_updated(RawBillingResult::ok(), Some(vec![purchase]));
        RawBillingResult::ok()
    }

    fn acknowledge_purchase(&self, reply: AcknowledgeReply) {
        if !self.is_ready() {
            reply.complete(disconnected());
            return;
        }

        let found = {
            let mut store = self.store();
            match store
                .owned
                .iter_mut()
                .find(|o| o.purchase.purchase_token == reply.purchase_token())
            {
                Some(owned) => {
                    owned.purchase.is_acknowledged = true;
                    true
                }
                None => false,
            }
        };

        reply.complete(if found {
            RawBillingResult::ok()
        } else {
            not_owned()
        });
    }

    fn consume_purchase(&self, reply: ConsumeReply) {
        if !self.is_ready() {
            reply.complete(disconnected());
            return;
        }

        let found = {
            let mut store = self.store();
            let before = store.owned.len();
            store
                .owned
                .retain(|o| o.purchase.purchase_token != reply.purchase_token());
            store.owned.len() != before
        };

        reply.complete(if found {
            RawBillingResult::ok()
        } else {
            not_owned()
        });
    }
}

fn disconnected() -> RawBillingResult {
    RawBillingResult::new(ResponseCode::SERVICE_DISCONNECTED, "Sandbox is not connected")
}

fn not_owned() -> RawBillingResult {
    RawBillingResult::new(ResponseCode::ITEM_NOT_OWNED, "Purchase token is not owned")
}
