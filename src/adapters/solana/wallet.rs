use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WalletError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidEncoding(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Decodes stored wallet keys into signing keypairs
pub struct WalletManager {
    keypair: Keypair,
}

impl WalletManager {
    /// Load keypair from a base58-encoded 64-byte secret key
    pub fn from_base58(encoded: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidEncoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Load keypair from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let keypair = Keypair::try_from(bytes)
            .map_err(|e| WalletError::InvalidKeypair(e.to_string()))?;

        Ok(Self { keypair })
    }

    /// Create a new random keypair (for testing)
    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    /// Get the public key as Pubkey
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Get keypair reference
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn into_keypair(self) -> Keypair {
        self.keypair
    }

    /// Export the secret key in the store's base58 format
    pub fn to_base58(&self) -> String {
        bs58::encode(self.keypair.to_bytes()).into_string()
    }
}

/// Parse a base58 address
pub fn parse_address(address: &str) -> Result<Pubkey, WalletError> {
    Pubkey::from_str(address.trim()).map_err(|e| WalletError::InvalidAddress(format!("{}: {}", address, e)))
}
