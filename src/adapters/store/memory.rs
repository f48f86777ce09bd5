use async_trait::async_trait;
use tokio::sync::RwLock;

use super::StoreDocument;
use crate::domain::{AgentSettings, UserId, UserSettings, WalletRecord};
use crate::ports::{StoreError, WalletStore};

/// In-process store; settings can be edited while controllers run
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: RwLock<StoreDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: StoreDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }

    pub async fn set_user_settings(&self, user: &UserId, settings: UserSettings) {
        let mut doc = self.document.write().await;
        doc.users.entry(user.to_string()).or_default().settings = settings;
    }

    pub async fn set_agent_settings(&self, user: &UserId, agent: &str, settings: AgentSettings) {
        let mut doc = self.document.write().await;
        doc.users
            .entry(user.to_string())
            .or_default()
            .agents
            .insert(agent.to_string(), settings);
    }

    /// Append a wallet. A new agent starts from the user's mirrored defaults
    /// unless it already has settings.
    pub async fn add_wallet(&self, user: &UserId, record: WalletRecord) {
        let mut doc = self.document.write().await;
        let user_doc = doc.users.entry(user.to_string()).or_default();
        if let Some(name) = record.agent_name.as_ref().filter(|_| record.is_agent()) {
            let template = user_doc.settings.agent_defaults();
            user_doc.agents.entry(name.clone()).or_insert(template);
        }
        user_doc.wallets.push(record);
    }

    pub async fn snapshot(&self) -> StoreDocument {
        self.document.read().await.clone()
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn agent_settings(
        &self,
        user: &UserId,
        agent: &str,
    ) -> Result<AgentSettings, StoreError> {
        Ok(self.document.read().await.agent_settings(user, agent))
    }

    async fn user_settings(&self, user: &UserId) -> Result<UserSettings, StoreError> {
        Ok(self.document.read().await.user_settings(user))
    }

    async fn user_wallets(&self, user: &UserId) -> Result<Vec<WalletRecord>, StoreError> {
        Ok(self.document.read().await.user_wallets(user))
    }
}
