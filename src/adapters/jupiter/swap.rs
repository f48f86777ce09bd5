//! Jupiter Swap Types
//!
//! Request and response structures for the Jupiter swap API.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Request body for building a swap transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// User's public key (wallet address)
    pub user_public_key: String,
    pub wrap_and_unwrap_sol: bool,
    pub use_shared_accounts: bool,
    pub as_legacy_transaction: bool,
    /// The full quote response from /quote, echoed back
    pub quote_response: serde_json::Value,
    /// Optional prioritization fee in lamports for faster inclusion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritization_fee_lamports: Option<u64>,
}

impl SwapRequest {
    pub fn new(user_public_key: String, quote_response: serde_json::Value) -> Self {
        Self {
            user_public_key,
            wrap_and_unwrap_sol: true,
            use_shared_accounts: false,
            as_legacy_transaction: true,
            quote_response,
            prioritization_fee_lamports: None,
        }
    }

    /// Set prioritization fee for faster transaction inclusion
    pub fn with_priority_fee(mut self, lamports: Option<u64>) -> Self {
        self.prioritization_fee_lamports = lamports;
        self
    }
}

/// Response from the swap API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Base64 encoded serialized transaction ready to sign and send
    #[serde(default)]
    pub swap_transaction: Option<String>,
    #[serde(default)]
    pub last_valid_block_height: Option<u64>,
}

impl SwapResponse {
    /// Decoded transaction bytes; `None` when the response carried no transaction
    pub fn transaction_bytes(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        self.swap_transaction
            .as_deref()
            .filter(|tx| !tx.is_empty())
            .map(|tx| base64::engine::general_purpose::STANDARD.decode(tx))
    }
}
