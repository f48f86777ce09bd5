//! Lynx - Agent wallet trading engine for Solana via the Jupiter aggregator
//!
//! Every agent wallet of a user runs its own buy/hold/sell cycle against the
//! user's chosen token. Fund commands move SOL between the user's root wallet,
//! the agent wallets and an external withdraw address.
//!
//! # Modules
//!
//! - `domain`: Core types (settings, wallet records, trade state, retry policy)
//! - `ports`: Trait abstractions (LedgerPort, SwapPort, WalletStore, Notifier)
//! - `adapters`: External implementations (Jupiter, Solana, store, notifiers, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Cycle controller, supervisor and fund transfers

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
