use crate::backend::{BackendCallback, SessionInput};
use crate::cache::{CatalogCache, PurchaseLedger};
use crate::config::SessionConfig;
use crate::connection::{ConnectAttempt, ConnectionMachine, ConnectionState, Transition};
use crate::error::{PurseError, Result};
use crate::event::BillingEvent;
use crate::flow::{FlowBuilder, FlowRequest, ReplacementMode};
use crate::model::{CatalogEntry, PurchaseRecord};
use crate::translate;

/// All mutable state of one purchase session.
///
/// Callers own exactly one instance and serialize access to it; `apply` is
/// the only path by which backend data reaches the caches.
#[derive(Debug, Default)]
pub struct SessionState {
    connection: ConnectionMachine,
    catalog: CatalogCache,
    ledger: PurchaseLedger,
    config: SessionConfig,
}

impl SessionState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    // ============================================================================
    // Connection
    // ============================================================================

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_ready(&self) -> bool {
        self.connection.is_ready()
    }

    /// Returns the new attempt when the caller should ask the backend to connect.
    pub fn begin_connect(&mut self) -> Option<ConnectAttempt> {
        self.connection.begin_connect()
    }

    /// Marks the session disconnected. Caches are kept.
    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    /// Fails with `NotConnected` unless the connection is ready.
    pub fn ensure_ready(&self) -> Result<()> {
        if self.connection.is_ready() {
            Ok(())
        } else {
            Err(PurseError::NotConnected {
                state: self.connection.state(),
            })
        }
    }

    // ============================================================================
    // Config
    // ============================================================================

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn set_account_id(&mut self, account_id: impl Into<String>) {
        self.config.account_id = account_id.into();
    }

    pub fn set_profile_id(&mut self, profile_id: impl Into<String>) {
        self.config.profile_id = profile_id.into();
    }

    pub fn set_personalized(&mut self, personalized: bool) {
        self.config.personalized = personalized;
    }

    // ============================================================================
    // Cache reads
    // ============================================================================

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub fn ledger(&self) -> &PurchaseLedger {
        &self.ledger
    }

    pub fn catalog_entry(&self, product_id: &str) -> Option<&CatalogEntry> {
        self.catalog.get(product_id)
    }

    pub fn purchase(&self, purchase_token: &str) -> Option<&PurchaseRecord> {
        self.ledger.get(purchase_token)
    }

    // ============================================================================
    // Flow construction
    // ============================================================================

    fn flow_builder(&self) -> FlowBuilder<'_> {
        FlowBuilder::new(&self.catalog, &self.config)
    }

    pub fn build_one_time_flow(&self, product_id: &str) -> Result<FlowRequest> {
        self.flow_builder().one_time(product_id)
    }

    pub fn build_consumable_flow(&self, product_ids: &[String]) -> Result<FlowRequest> {
        self.flow_builder().consumable(product_ids)
    }

    pub fn build_subscription_flow(&self, product_id: &str, base_plan_id: &str) -> Result<FlowRequest> {
        self.flow_builder().subscription(product_id, base_plan_id)
    }

    pub fn build_subscription_update_flow(
        &self,
        product_id: &str,
        base_plan_id: &str,
        old_purchase_token: &str,
        external_transaction_id: Option<&str>,
        replacement_mode: ReplacementMode,
    ) -> Result<FlowRequest> {
        self.flow_builder().subscription_update(
            product_id,
            base_plan_id,
            old_purchase_token,
            external_transaction_id,
            replacement_mode,
        )
    }

    // ============================================================================
    // Inbound
    // ============================================================================

    /// Applies one inbound signal and returns the event to emit, if any.
    ///
    /// Never fails: malformed payloads are dropped by the translator and a
    /// failing backend result is carried in the event unchanged.
    pub fn apply(&mut self, input: SessionInput) -> Option<BillingEvent> {
        match input {
            SessionInput::Backend(callback) => self.apply_callback(callback),
            SessionInput::Resumed => {
                if self.connection.is_ready() {
                    Some(BillingEvent::SessionResumed)
                } else {
                    tracing::debug!(
                        "[SessionCore] Resume while {}; nothing to re-validate",
                        self.connection.state()
                    );
                    None
                }
            }
        }
    }

    fn apply_callback(&mut self, callback: BackendCallback) -> Option<BillingEvent> {
        match callback {
            BackendCallback::SetupFinished { attempt, result } => {
                let result = translate::operation_result(&result);
                match self.connection.setup_finished(attempt, &result) {
                    Transition::Stale => tracing::warn!(
                        "[SessionCore] Setup result ({}) from abandoned attempt {}; connection stays {}",
                        result.status_code,
                        attempt,
                        self.connection.state()
                    ),
                    Transition::Applied => tracing::info!(
                        "[SessionCore] Setup finished ({}); connection {}",
                        result.status_code,
                        self.connection.state()
                    ),
                }
                Some(BillingEvent::ConnectionReady { result })
            }
            BackendCallback::ServiceDisconnected => {
                tracing::info!("[SessionCore] Billing service disconnected");
                self.connection.service_disconnected();
                Some(BillingEvent::ConnectionLost)
            }
            BackendCallback::ProductDetails { result, products } => {
                let result = translate::operation_result(&result);
                let entries = if result.is_ok() {
                    translate::catalog_entries(products)
                } else {
                    Vec::new()
                };
                self.catalog.replace_all(&entries);
                tracing::debug!(
                    "[SessionCore] Catalog query completed ({}): {} entries",
                    result.status_code,
                    entries.len()
                );
                Some(BillingEvent::CatalogQueryCompleted { result, entries })
            }
            BackendCallback::PurchasesQueried { result, purchases } => {
                let result = translate::operation_result(&result);
                let purchases = translate::purchase_records(purchases);
                self.ledger.replace_all(&purchases);
                tracing::debug!(
                    "[SessionCore] Purchase query completed ({}): {} records",
                    result.status_code,
                    purchases.len()
                );
                Some(BillingEvent::PurchaseQueryCompleted { result, purchases })
            }
            BackendCallback::PurchasesUpdated { result, purchases } => {
                let result = translate::operation_result(&result);
                let purchases = translate::purchase_records(purchases);
                self.ledger.replace_all(&purchases);
                tracing::debug!(
                    "[SessionCore] Purchases updated ({}): {} records",
                    result.status_code,
                    purchases.len()
                );
                Some(BillingEvent::PurchasesUpdated { result, purchases })
            }
            BackendCallback::Acknowledged {
                result,
                purchase_token,
            } => Some(BillingEvent::AcknowledgeCompleted {
                result: translate::operation_result(&result),
                purchase_token,
            }),
            BackendCallback::Consumed {
                result,
                purchase_token,
            } => Some(BillingEvent::ConsumeCompleted {
                result: translate::operation_result(&result),
                purchase_token,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        RawBillingResult, RawOneTimePurchaseOfferDetails, RawProductDetails, RawPurchase,
    };
    use crate::model::{OperationResult, ResponseCode};

    fn backend(callback: BackendCallback) -> SessionInput {
        SessionInput::Backend(callback)
    }

    fn setup(attempt: ConnectAttempt, result: RawBillingResult) -> SessionInput {
        backend(BackendCallback::SetupFinished { attempt, result })
    }

    fn connected() -> SessionState {
        let mut state = SessionState::default();
        let attempt = state.begin_connect().unwrap();
        state.apply(setup(attempt, RawBillingResult::ok()));
        state
    }

    fn raw_product(product_id: &str, title: &str, priced: bool) -> RawProductDetails {
        RawProductDetails {
            product_id: product_id.to_string(),
            product_type: "inapp".to_string(),
            name: title.to_string(),
            title: title.to_string(),
            description: String::new(),
            one_time_purchase_offer_details: priced.then(|| RawOneTimePurchaseOfferDetails {
                formatted_price: "$1.00".to_string(),
                price_amount_micros: 1_000_000,
                price_currency_code: "USD".to_string(),
            }),
            subscription_offer_details: None,
        }
    }

    fn raw_purchase(token: &str, acknowledged: bool) -> RawPurchase {
        RawPurchase {
            purchase_token: token.to_string(),
            products: vec!["p1".to_string()],
            purchase_state: 1,
            quantity: 1,
            is_acknowledged: acknowledged,
            ..Default::default()
        }
    }

    #[test]
    fn test_setup_success_emits_ready() {
        let mut state = SessionState::default();
        let attempt = state.begin_connect().unwrap();

        let event = state.apply(setup(attempt, RawBillingResult::ok()));

        assert_eq!(
            event,
            Some(BillingEvent::ConnectionReady {
                result: OperationResult::ok()
            })
        );
        assert!(state.is_ready());
    }

    #[test]
    fn test_setup_failure_stays_disconnected_but_emits() {
        let mut state = SessionState::default();
        let attempt = state.begin_connect().unwrap();

        let event = state.apply(setup(
            attempt,
            RawBillingResult::new(ResponseCode::BILLING_UNAVAILABLE, "no billing"),
        ));

        match event {
            Some(BillingEvent::ConnectionReady { result }) => {
                assert_eq!(result.status_code, ResponseCode::BILLING_UNAVAILABLE);
                assert_eq!(result.debug_message, "no billing");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(state.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_setup_after_teardown_emits_without_connecting() {
        let mut state = SessionState::default();
        let attempt = state.begin_connect().unwrap();
        state.disconnect();

        let event = state.apply(setup(attempt, RawBillingResult::ok()));

        assert_eq!(
            event,
            Some(BillingEvent::ConnectionReady {
                result: OperationResult::ok()
            })
        );
        assert_eq!(state.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_resume_only_emits_when_connected() {
        let mut state = SessionState::default();
        assert_eq!(state.apply(SessionInput::Resumed), None);

        let mut state = connected();
        assert_eq!(
            state.apply(SessionInput::Resumed),
            Some(BillingEvent::SessionResumed)
        );
        assert!(state.is_ready());
    }

    #[test]
    fn test_catalog_failure_emits_empty_list_and_keeps_cache() {
        let mut state = connected();
        state.apply(backend(BackendCallback::ProductDetails {
            result: RawBillingResult::ok(),
            products: Some(vec![raw_product("p1", "Coins", true)]),
        }));

        let event = state.apply(backend(BackendCallback::ProductDetails {
            result: RawBillingResult::new(ResponseCode::NETWORK_ERROR, "offline"),
            products: Some(vec![raw_product("p1", "Changed", false)]),
        }));

        match event {
            Some(BillingEvent::CatalogQueryCompleted { result, entries }) => {
                assert_eq!(result.status_code, ResponseCode::NETWORK_ERROR);
                assert!(entries.is_empty());
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(state.catalog_entry("p1").unwrap().title, "Coins");
    }

    #[test]
    fn test_requery_replaces_entry_wholesale() {
        let mut state = connected();
        state.apply(backend(BackendCallback::ProductDetails {
            result: RawBillingResult::ok(),
            products: Some(vec![raw_product("p1", "Coins", true)]),
        }));
        state.apply(backend(BackendCallback::ProductDetails {
            result: RawBillingResult::ok(),
            products: Some(vec![raw_product("p1", "Gems", false)]),
        }));

        let entry = state.catalog_entry("p1").unwrap();
        assert_eq!(entry.title, "Gems");
        assert!(entry.one_time_offer.is_none());
        assert_eq!(state.catalog().len(), 1);
    }

    #[test]
    fn test_unsolicited_update_overwrites_and_emits_updated() {
        let mut state = connected();
        state.apply(backend(BackendCallback::PurchasesQueried {
            result: RawBillingResult::ok(),
            purchases: Some(vec![raw_purchase("t1", false)]),
        }));

        let event = state.apply(backend(BackendCallback::PurchasesUpdated {
            result: RawBillingResult::ok(),
            purchases: Some(vec![raw_purchase("t1", true)]),
        }));

        assert!(matches!(event, Some(BillingEvent::PurchasesUpdated { .. })));
        assert!(state.purchase("t1").unwrap().acknowledged);
        assert_eq!(state.ledger().len(), 1);
    }

    #[test]
    fn test_acknowledge_does_not_touch_ledger() {
        let mut state = connected();
        state.apply(backend(BackendCallback::PurchasesQueried {
            result: RawBillingResult::ok(),
            purchases: Some(vec![raw_purchase("t1", false)]),
        }));

        let event = state.apply(backend(BackendCallback::Acknowledged {
            result: RawBillingResult::ok(),
            purchase_token: "t1".to_string(),
        }));

        assert!(matches!(
            event,
            Some(BillingEvent::AcknowledgeCompleted { ref purchase_token, .. }) if purchase_token == "t1"
        ));
        assert!(!state.purchase("t1").unwrap().acknowledged);
    }

    #[test]
    fn test_disconnect_keeps_caches() {
        let mut state = connected();
        state.apply(backend(BackendCallback::ProductDetails {
            result: RawBillingResult::ok(),
            products: Some(vec![raw_product("p1", "Coins", true)]),
        }));

        state.disconnect();
        assert!(state.ensure_ready().unwrap_err().is_not_connected());
        assert!(state.catalog_entry("p1").is_some());
    }

    #[test]
    fn test_config_setters_feed_flows() {
        let mut state = connected();
        state.apply(backend(BackendCallback::ProductDetails {
            result: RawBillingResult::ok(),
            products: Some(vec![raw_product("p1", "Coins", true)]),
        }));

        state.set_account_id("acct");
        state.set_profile_id("prof");
        state.set_personalized(true);

        let request = state.build_one_time_flow("p1").unwrap();
        assert_eq!(request.account_id.as_deref(), Some("acct"));
        assert_eq!(request.profile_id.as_deref(), Some("prof"));
        assert!(request.offer_personalized);
    }
}
