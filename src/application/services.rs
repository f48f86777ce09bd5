use std::sync::Arc;

use crate::domain::{SharedState, UserId};
use crate::ports::{LedgerPort, Notifier, SwapPort, TradeEvent, WalletStore};

/// Collaborators shared by the supervisor, every controller and the fund
/// operations
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn WalletStore>,
    pub ledger: Arc<dyn LedgerPort>,
    pub swap: Arc<dyn SwapPort>,
    pub state: Arc<SharedState>,
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl Services {
    pub fn new(
        store: Arc<dyn WalletStore>,
        ledger: Arc<dyn LedgerPort>,
        swap: Arc<dyn SwapPort>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            store,
            ledger,
            swap,
            state,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Forward an event to the sink, if one is configured
    pub async fn notify(&self, user: &UserId, event: TradeEvent) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(user, &event.to_string()).await;
        }
    }
}
