use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

use crate::domain::TradeError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("RPC request failed: {0}")]
    RpcError(String),
    #[error("Transaction failed: {0}")]
    TransactionError(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

impl From<LedgerError> for TradeError {
    fn from(err: LedgerError) -> Self {
        TradeError::Ledger(err.to_string())
    }
}

/// Options for submitting a pre-serialized transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    pub skip_preflight: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            skip_preflight: true,
        }
    }
}

/// Ledger primitives shared by the swap client and fund transfers
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// Balance in lamports
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, LedgerError>;

    /// Recent blockhash used as the transaction validity anchor
    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError>;

    /// Submit a signed legacy transaction; returns its signature
    async fn submit_transaction(&self, transaction: &Transaction) -> Result<String, LedgerError>;

    /// Submit an already signed and serialized transaction; returns its signature
    async fn send_raw_transaction(
        &self,
        raw: Vec<u8>,
        options: SendOptions,
    ) -> Result<String, LedgerError>;
}
