//! Wallet Identity
//!
//! User ids, the composite (user, agent) key, and the wallet records the
//! settings/wallet store hands out.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};

/// Identifier of the user owning a set of wallets (the chat id upstream)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Composite key for per-agent state: one entry per (user, agent name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentKey {
    pub user: UserId,
    pub agent: String,
}

impl AgentKey {
    pub fn new(user: UserId, agent: impl Into<String>) -> Self {
        Self {
            user,
            agent: agent.into(),
        }
    }
}

impl fmt::Display for AgentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.agent)
    }
}

/// Role of a stored wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletRole {
    /// The user's funding wallet
    Root,
    /// A wallet dedicated to one trading agent
    Agent,
}

/// Wallet record as stored by the external wallet store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Ordinal within the user's wallets
    pub index: u32,
    /// Base58-encoded 64-byte secret key
    pub base58_key: String,
    pub role: WalletRole,
    /// Set for agent wallets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
}

impl WalletRecord {
    pub fn root(index: u32, base58_key: impl Into<String>) -> Self {
        Self {
            index,
            base58_key: base58_key.into(),
            role: WalletRole::Root,
            agent_name: None,
        }
    }

    pub fn agent(index: u32, base58_key: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            index,
            base58_key: base58_key.into(),
            role: WalletRole::Agent,
            agent_name: Some(agent_name.into()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.role == WalletRole::Root
    }

    pub fn is_agent(&self) -> bool {
        self.role == WalletRole::Agent
    }

    /// Display name used in logs and reports
    pub fn label(&self) -> &str {
        match (&self.role, &self.agent_name) {
            (WalletRole::Agent, Some(name)) => name,
            (WalletRole::Agent, None) => "unnamed",
            (WalletRole::Root, _) => "root",
        }
    }
}

/// An agent wallet with its decoded signing key
#[derive(Clone)]
pub struct AgentWallet {
    pub key: AgentKey,
    pub index: u32,
    keypair: Arc<Keypair>,
}

impl AgentWallet {
    pub fn new(key: AgentKey, index: u32, keypair: Arc<Keypair>) -> Self {
        Self { key, index, keypair }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl fmt::Debug for AgentWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentWallet")
            .field("key", &self.key)
            .field("index", &self.index)
            .field("pubkey", &self.pubkey())
            .finish()
    }
}
