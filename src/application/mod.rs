//! Application Layer - Trading orchestration
//!
//! Wires the ports together: per-agent cycle controllers, the per-user
//! supervisor that runs them, and the fund transfer commands.

pub mod cycle;
pub mod funds;
pub mod services;
pub mod supervisor;

pub use cycle::{CycleConfig, CycleController, CycleState, CycleSummary};
pub use funds::{FundTransfer, FundsConfig, FundsError, WalletBalance};
pub use services::Services;
pub use supervisor::{SupervisorError, TradingSupervisor};
