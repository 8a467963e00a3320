use purse_core::backend::{InputReceiver, SessionInput};
use purse_core::{BillingEvent, SessionState};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// The session's single control point.
///
/// Drains the inbound channel in arrival order, applies each input to the
/// shared [`SessionState`] and forwards the resulting event. Events leave in
/// the same order their inputs arrived.
pub struct CallbackDispatcher {
    state: Arc<Mutex<SessionState>>,
    inbound: InputReceiver,
    events: mpsc::UnboundedSender<BillingEvent>,
}

impl CallbackDispatcher {
    pub(crate) fn new(
        state: Arc<Mutex<SessionState>>,
        inbound: InputReceiver,
        events: mpsc::UnboundedSender<BillingEvent>,
    ) -> Self {
        Self {
            state,
            inbound,
            events,
        }
    }

    /// Runs until every inbound sender (session and backend) is gone.
    pub async fn run(mut self) {
        while self.dispatch_next().await {}
        tracing::debug!("[Dispatcher] Inbound channel closed, stopping");
    }

    /// Waits for and handles one input. Returns `false` once the channel is closed.
    pub async fn dispatch_next(&mut self) -> bool {
        match self.inbound.recv().await {
            Some(input) => {
                self.handle(input).await;
                true
            }
            None => false,
        }
    }

    /// Handles every input already queued without waiting for more.
    ///
    /// Returns the number of inputs handled.
    pub async fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(input) = self.inbound.try_recv() {
            self.handle(input).await;
            handled += 1;
        }
        handled
    }

    async fn handle(&mut self, input: SessionInput) {
        tracing::debug!("[Dispatcher] Handling {}", input_label(&input));

        let event = {
            let mut state = self.state.lock().await;
            state.apply(input)
        };

        if let Some(event) = event {
            tracing::debug!("[Dispatcher] Emitting {}", event.name());
            if self.events.send(event).is_err() {
                tracing::debug!("[Dispatcher] Event receiver dropped, discarding event");
            }
        }
    }
}

fn input_label(input: &SessionInput) -> &'static str {
    use purse_core::backend::BackendCallback;

    match input {
        SessionInput::Resumed => "resumed",
        SessionInput::Backend(callback) => match callback {
            BackendCallback::SetupFinished { .. } => "setup_finished",
            BackendCallback::ServiceDisconnected => "service_disconnected",
            BackendCallback::ProductDetails { .. } => "product_details",
            BackendCallback::PurchasesQueried { .. } => "purchases_queried",
            BackendCallback::PurchasesUpdated { .. } => "purchases_updated",
            BackendCallback::Acknowledged { .. } => "acknowledged",
            BackendCallback::Consumed { .. } => "consumed",
        },
    }
}
