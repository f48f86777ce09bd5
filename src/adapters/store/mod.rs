//! Wallet Store Adapters
//!
//! Read-only views over the settings/wallet document maintained by the
//! chat layer. The document is keyed by user id:
//!
//! ```json
//! { "users": { "42": {
//!     "settings": { "token_address": "...", "withdraw_address": "..." },
//!     "wallets":  [ { "index": 0, "base58_key": "...", "role": "root" } ],
//!     "agents":   { "alpha": { "fixed_buy": 0.01, "fixed_sell_delay": 30 } }
//! } } }
//! ```

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{AgentSettings, UserId, UserSettings, WalletRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreDocument {
    pub users: HashMap<String, UserDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDocument {
    pub settings: UserSettings,
    pub wallets: Vec<WalletRecord>,
    pub agents: HashMap<String, AgentSettings>,
}

impl StoreDocument {
    fn user(&self, user: &UserId) -> Option<&UserDocument> {
        self.users.get(user.as_str())
    }

    pub(crate) fn agent_settings(&self, user: &UserId, agent: &str) -> AgentSettings {
        self.user(user)
            .and_then(|doc| doc.agents.get(agent))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn user_settings(&self, user: &UserId) -> UserSettings {
        self.user(user)
            .map(|doc| doc.settings.clone())
            .unwrap_or_default()
    }

    pub(crate) fn user_wallets(&self, user: &UserId) -> Vec<WalletRecord> {
        let mut wallets = self
            .user(user)
            .map(|doc| doc.wallets.clone())
            .unwrap_or_default();
        wallets.sort_by_key(|w| w.index);
        wallets
    }
}
