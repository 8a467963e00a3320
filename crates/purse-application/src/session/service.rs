use purse_core::backend::{
    AcknowledgeReply, CatalogReply, ConnectionListener, ConsumeReply, InputSender, PurchasesReply,
    SessionInput, input_channel,
};
use purse_core::config::SessionConfig;
use purse_core::error::{PurseError, Result};
use purse_core::flow::{FlowRequest, ReplacementMode};
use purse_core::model::{CatalogEntry, OperationResult, ProductKind, PurchaseRecord};
use purse_core::session::{pair_queries, pair_wire_queries};
use purse_core::{BillingBackend, BillingEvent, ConnectionState, SessionState, translate};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use super::dispatcher::CallbackDispatcher;

/// Receiving end of the session's event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<BillingEvent>;

/// Caller-facing purchase session.
///
/// `BillingSession` is responsible for:
/// - Validating commands against the connection state and the caches
/// - Issuing backend requests with reply handles wired to the inbound channel
/// - Building and launching purchase flows
/// - Exposing read access to the caches
///
/// Backend outcomes are not handled here; they reach the state through the
/// [`CallbackDispatcher`] returned alongside the session.
pub struct BillingSession {
    backend: Arc<dyn BillingBackend>,
    state: Arc<Mutex<SessionState>>,
    inbound: InputSender,
}

impl BillingSession {
    /// Creates a session with its dispatcher and event stream.
    ///
    /// The dispatcher must be driven (spawned or polled) for callbacks to
    /// take effect.
    pub fn new(
        backend: Arc<dyn BillingBackend>,
        config: SessionConfig,
    ) -> (Self, CallbackDispatcher, EventReceiver) {
        let (inbound, inbound_rx) = input_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(SessionState::new(config)));

        let dispatcher = CallbackDispatcher::new(state.clone(), inbound_rx, events_tx);
        let session = Self {
            backend,
            state,
            inbound,
        };

        (session, dispatcher, events_rx)
    }

    /// Creates a session and spawns its dispatcher on the current Tokio runtime.
    pub fn spawn(backend: Arc<dyn BillingBackend>, config: SessionConfig) -> (Self, EventReceiver) {
        let (session, dispatcher, events) = Self::new(backend, config);
        tokio::spawn(dispatcher.run());
        (session, events)
    }

    // ============================================================================
    // Connection
    // ============================================================================

    /// Starts connecting unless already connecting or connected.
    pub async fn connect(&self) {
        let attempt = self.state.lock().await.begin_connect();

        if let Some(attempt) = attempt {
            tracing::info!("[SessionCore] Starting billing connection (attempt {})", attempt);
            self.backend
                .start_connection(ConnectionListener::new(self.inbound.clone(), attempt));
        } else {
            tracing::debug!("[SessionCore] connect() ignored; already connecting or connected");
        }
    }

    /// Tears the connection down. Cached catalog and purchases are kept.
    pub async fn disconnect(&self) {
        self.state.lock().await.disconnect();
        tracing::info!("[SessionCore] Ending billing connection");
        self.backend.end_connection();
    }

    pub async fn is_ready(&self) -> bool {
        self.state.lock().await.is_ready()
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.state.lock().await.connection_state()
    }

    /// The backend's own view of its connection.
    pub fn backend_connection_state(&self) -> ConnectionState {
        self.backend.connection_state()
    }

    /// Signals that the host process came back to the foreground.
    pub fn notify_resumed(&self) {
        if self.inbound.send(SessionInput::Resumed).is_err() {
            tracing::debug!("[SessionCore] Dispatcher gone, dropping resume signal");
        }
    }

    // ============================================================================
    // Config
    // ============================================================================

    pub async fn set_account_id(&self, account_id: impl Into<String>) {
        self.state.lock().await.set_account_id(account_id);
    }

    pub async fn set_profile_id(&self, profile_id: impl Into<String>) {
        self.state.lock().await.set_profile_id(profile_id);
    }

    pub async fn set_personalized(&self, personalized: bool) {
        self.state.lock().await.set_personalized(personalized);
    }

    pub async fn config(&self) -> SessionConfig {
        self.state.lock().await.config().clone()
    }

    // ============================================================================
    // Queries
    // ============================================================================

    /// Queries catalog entries for parallel id/kind lists.
    ///
    /// Unpaired or empty entries are skipped; see [`pair_queries`].
    pub async fn query_catalog(&self, product_ids: &[String], kinds: &[ProductKind]) -> Result<()> {
        self.ensure_ready().await?;
        let batch = pair_queries(product_ids, kinds)?;
        tracing::debug!("[SessionCore] Querying {} catalog entries", batch.len());
        self.backend
            .query_product_details(batch, CatalogReply::new(self.inbound.clone()));
        Ok(())
    }

    /// Same as [`query_catalog`](Self::query_catalog) with kinds given as strings.
    pub async fn query_catalog_wire(&self, product_ids: &[String], kinds: &[String]) -> Result<()> {
        self.ensure_ready().await?;
        let batch = pair_wire_queries(product_ids, kinds)?;
        tracing::debug!("[SessionCore] Querying {} catalog entries", batch.len());
        self.backend
            .query_product_details(batch, CatalogReply::new(self.inbound.clone()));
        Ok(())
    }

    pub async fn query_purchases(&self, kind: ProductKind) -> Result<()> {
        self.ensure_ready().await?;
        tracing::debug!("[SessionCore] Querying {} purchases", kind);
        self.backend
            .query_purchases(kind, PurchasesReply::new(self.inbound.clone(), kind));
        Ok(())
    }

    // ============================================================================
    // Purchase flows
    // ============================================================================

    pub async fn purchase_one_time(&self, product_id: &str) -> Result<OperationResult> {
        let request = self
            .ready_flow(|state| state.build_one_time_flow(product_id))
            .await?;
        Ok(self.launch(&request))
    }

    pub async fn purchase_consumable(&self, product_ids: &[String]) -> Result<OperationResult> {
        let request = self
            .ready_flow(|state| state.build_consumable_flow(product_ids))
            .await?;
        Ok(self.launch(&request))
    }

    pub async fn purchase_subscription(
        &self,
        product_id: &str,
        base_plan_id: &str,
    ) -> Result<OperationResult> {
        let request = self
            .ready_flow(|state| state.build_subscription_flow(product_id, base_plan_id))
            .await?;
        Ok(self.launch(&request))
    }

    pub async fn update_subscription(
        &self,
        product_id: &str,
        base_plan_id: &str,
        old_purchase_token: &str,
        external_transaction_id: Option<&str>,
        replacement_mode: ReplacementMode,
    ) -> Result<OperationResult> {
        let request = self
            .ready_flow(|state| {
                state.build_subscription_update_flow(
                    product_id,
                    base_plan_id,
                    old_purchase_token,
                    external_transaction_id,
                    replacement_mode,
                )
            })
            .await?;
        Ok(self.launch(&request))
    }

    /// Builds the one-time flow request without launching it.
    pub async fn build_one_time_flow(&self, product_id: &str) -> Result<FlowRequest> {
        self.state.lock().await.build_one_time_flow(product_id)
    }

    /// Builds the consumable flow request without launching it.
    pub async fn build_consumable_flow(&self, product_ids: &[String]) -> Result<FlowRequest> {
        self.state.lock().await.build_consumable_flow(product_ids)
    }

    /// Builds the subscription flow request without launching it.
    pub async fn build_subscription_flow(
        &self,
        product_id: &str,
        base_plan_id: &str,
    ) -> Result<FlowRequest> {
        self.state
            .lock()
            .await
            .build_subscription_flow(product_id, base_plan_id)
    }

    /// Builds the subscription update flow request without launching it.
    pub async fn build_subscription_update_flow(
        &self,
        product_id: &str,
        base_plan_id: &str,
        old_purchase_token: &str,
        external_transaction_id: Option<&str>,
        replacement_mode: ReplacementMode,
    ) -> Result<FlowRequest> {
        self.state.lock().await.build_subscription_update_flow(
            product_id,
            base_plan_id,
            old_purchase_token,
            external_transaction_id,
            replacement_mode,
        )
    }

    fn launch(&self, request: &FlowRequest) -> OperationResult {
        tracing::debug!(
            "[SessionCore] Launching flow for {:?}",
            request.product_ids()
        );

        let result = translate::operation_result(&self.backend.launch_billing_flow(request));
        if !result.is_ok() {
            tracing::warn!(
                "[SessionCore] Flow launch rejected ({}): {}",
                result.status_code,
                result.debug_message
            );
        }
        result
    }

    // ============================================================================
    // Acknowledge / consume
    // ============================================================================

    pub async fn acknowledge(&self, purchase_token: &str) -> Result<()> {
        self.ensure_ready().await?;
        require_token(purchase_token)?;
        tracing::debug!("[SessionCore] Acknowledging {}", purchase_token);
        self.backend
            .acknowledge_purchase(AcknowledgeReply::new(self.inbound.clone(), purchase_token));
        Ok(())
    }

    pub async fn consume(&self, purchase_token: &str) -> Result<()> {
        self.ensure_ready().await?;
        require_token(purchase_token)?;
        tracing::debug!("[SessionCore] Consuming {}", purchase_token);
        self.backend
            .consume_purchase(ConsumeReply::new(self.inbound.clone(), purchase_token));
        Ok(())
    }

    // ============================================================================
    // Cache reads
    // ============================================================================

    pub async fn catalog_entry(&self, product_id: &str) -> Option<CatalogEntry> {
        self.state.lock().await.catalog_entry(product_id).cloned()
    }

    pub async fn catalog_entries(&self) -> Vec<CatalogEntry> {
        self.state.lock().await.catalog().entries()
    }

    pub async fn purchase(&self, purchase_token: &str) -> Option<PurchaseRecord> {
        self.state.lock().await.purchase(purchase_token).cloned()
    }

    pub async fn purchases(&self) -> Vec<PurchaseRecord> {
        self.state.lock().await.ledger().records()
    }

    pub async fn purchases_for_product(&self, product_id: &str) -> Vec<PurchaseRecord> {
        self.state.lock().await.ledger().for_product(product_id)
    }

    // ============================================================================
    // Helpers
    // ============================================================================

    async fn ensure_ready(&self) -> Result<()> {
        self.state.lock().await.ensure_ready()
    }

    /// Builds a flow request from the caches, then checks readiness under the
    /// same lock. An unknown product is `NotFound` whatever the connection state.
    async fn ready_flow<F>(&self, build: F) -> Result<FlowRequest>
    where
        F: FnOnce(&SessionState) -> Result<FlowRequest>,
    {
        let state = self.state.lock().await;
        let request = build(&state)?;
        state.ensure_ready()?;
        Ok(request)
    }
}

fn require_token(purchase_token: &str) -> Result<()> {
    if purchase_token.is_empty() {
        return Err(PurseError::malformed("purchase token must not be empty"));
    }
    Ok(())
}
