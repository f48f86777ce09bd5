//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - The ledger (balances, blockhash, transaction submission)
//! - The settings/wallet store
//! - Token swaps against SOL
//! - Notification sinks

pub mod ledger;
pub mod mocks;
pub mod notifier;
pub mod store;
pub mod swap;

pub use ledger::{LedgerError, LedgerPort, SendOptions};
pub use notifier::{Notifier, TradeEvent};
pub use store::{StoreError, WalletStore};
pub use swap::{BuyFill, SwapOptions, SwapPort};
