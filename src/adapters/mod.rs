//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Jupiter: DEX aggregator API client
//! - Solana: RPC client and wallet management
//! - Store: settings/wallet document (JSON file, in-memory)
//! - Notify: log and Telegram sinks
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod jupiter;
pub mod notify;
pub mod solana;
pub mod store;

pub use cli::CliApp;
pub use jupiter::JupiterClient;
pub use notify::{LogNotifier, TelegramNotifier};
pub use solana::{SolanaClient, WalletManager};
pub use store::{JsonFileStore, MemoryStore};
