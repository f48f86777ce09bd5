use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{AgentSettings, UserId, UserSettings, WalletRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read store: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse store: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the external settings/wallet store.
///
/// Missing users and agents resolve to default settings and an empty wallet
/// list; only an unreadable store is an error.
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn agent_settings(
        &self,
        user: &UserId,
        agent: &str,
    ) -> Result<AgentSettings, StoreError>;

    async fn user_settings(&self, user: &UserId) -> Result<UserSettings, StoreError>;

    /// Root and agent wallet records, ordered by index
    async fn user_wallets(&self, user: &UserId) -> Result<Vec<WalletRecord>, StoreError>;
}
