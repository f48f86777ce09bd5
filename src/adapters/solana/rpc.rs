use async_trait::async_trait;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    transaction::{Transaction, VersionedTransaction},
};
use solana_transaction_status::UiTransactionEncoding;
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{LedgerError, LedgerPort, SendOptions};

/// Wrapper around Solana RPC client with async-compatible methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
}

impl SolanaClient {
    /// Create a new Solana RPC client
    pub fn new(rpc_url: String, commitment: CommitmentConfig, timeout: Duration) -> Self {
        let client = Arc::new(RpcClient::new_with_timeout_and_commitment(
            rpc_url, timeout, commitment,
        ));
        Self { client }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

/// Parse a commitment level name ("processed", "confirmed", "finalized")
pub fn parse_commitment(level: &str) -> Option<CommitmentConfig> {
    match level.trim().to_ascii_lowercase().as_str() {
        "processed" => Some(CommitmentConfig::processed()),
        "confirmed" => Some(CommitmentConfig::confirmed()),
        "finalized" => Some(CommitmentConfig::finalized()),
        _ => None,
    }
}

fn join_error(e: tokio::task::JoinError) -> LedgerError {
    LedgerError::RpcError(format!("Task join error: {}", e))
}

#[async_trait]
impl LedgerPort for SolanaClient {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, LedgerError> {
        let pubkey = *pubkey;
        // Spawn blocking to make sync RPC call async-compatible
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .get_balance(&pubkey)
                .map_err(|e| LedgerError::RpcError(e.to_string()))
        })
        .await
        .map_err(join_error)?
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .get_latest_blockhash()
                .map_err(|e| LedgerError::RpcError(e.to_string()))
        })
        .await
        .map_err(join_error)?
    }

    async fn submit_transaction(&self, transaction: &Transaction) -> Result<String, LedgerError> {
        let tx = transaction.clone();
        let client = Arc::clone(&self.client);

        tokio::task::spawn_blocking(move || {
            client
                .send_transaction(&tx)
                .map(|sig| sig.to_string())
                .map_err(|e| LedgerError::TransactionError(e.to_string()))
        })
        .await
        .map_err(join_error)?
    }

    async fn send_raw_transaction(
        &self,
        raw: Vec<u8>,
        options: SendOptions,
    ) -> Result<String, LedgerError> {
        let tx: VersionedTransaction = bincode::deserialize(&raw)
            .map_err(|e| LedgerError::TransactionError(format!("Invalid raw transaction: {}", e)))?;
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            encoding: Some(UiTransactionEncoding::Base64),
            ..RpcSendTransactionConfig::default()
        };
        let client = Arc::clone(&self.client);

        tokio::task::spawn_blocking(move || {
            client
                .send_transaction_with_config(&tx, config)
                .map(|sig| sig.to_string())
                .map_err(|e| LedgerError::TransactionError(e.to_string()))
        })
        .await
        .map_err(join_error)?
    }
}
