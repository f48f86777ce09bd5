//! Domain Layer - Core types for the Lynx agent trading engine
//!
//! Pure types and rules with no I/O. Everything that touches the network,
//! the ledger or the wallet store goes through the ports layer.

pub mod error;
pub mod identity;
pub mod report;
pub mod retry;
pub mod settings;
pub mod trade_state;
pub mod units;

pub use error::TradeError;
pub use identity::{AgentKey, AgentWallet, UserId, WalletRecord, WalletRole};
pub use report::{TransferOutcome, TransferReport, WalletOutcome};
pub use retry::RetryPolicy;
pub use settings::{AgentSettings, UserSettings};
pub use trade_state::{SharedState, TradeState};
pub use units::{
    lamports_to_sol, slippage_bps, sol_to_lamports, LAMPORTS_PER_SOL, MIN_SWAP_LAMPORTS, WSOL_MINT,
};
