//! Agent and User Settings
//!
//! Read-only snapshots of what the configuration layer stored for a user and
//! each of their agents. Missing fields fall back to the same defaults the
//! store applies when a record is first created.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::units::sol_to_lamports;

/// Per-agent trading parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// SOL spent on each buy; <= 0 blocks buying
    pub fixed_buy: Decimal,
    /// Seconds to hold between buy and sell
    pub fixed_sell_delay: u64,
    /// Seconds to rest after a cycle
    pub fixed_rest_delay: u64,
    /// Buy slippage in percent (0 = use the client default)
    pub buy_slippage: Decimal,
    /// Sell slippage in percent (0 = use the client default)
    pub sell_slippage: Decimal,
    /// Priority fee in SOL attached to swaps
    pub tip: Decimal,
    /// When false, cycles buy and rest without selling
    pub sell_enabled: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            fixed_buy: Decimal::ZERO,
            fixed_sell_delay: 0,
            fixed_rest_delay: 0,
            buy_slippage: Decimal::ZERO,
            sell_slippage: Decimal::ZERO,
            tip: Decimal::ZERO,
            sell_enabled: true,
        }
    }
}

impl AgentSettings {
    /// True when a positive buy amount is configured
    pub fn is_buy_configured(&self) -> bool {
        self.fixed_buy > Decimal::ZERO
    }

    /// Buy amount in lamports, `None` when unset or unrepresentable
    pub fn fixed_buy_lamports(&self) -> Option<u64> {
        if !self.is_buy_configured() {
            return None;
        }
        sol_to_lamports(self.fixed_buy)
    }

    pub fn sell_delay(&self) -> Duration {
        Duration::from_secs(self.fixed_sell_delay)
    }

    /// Rest delay, never shorter than `floor`
    pub fn rest_delay(&self, floor: Duration) -> Duration {
        Duration::from_secs(self.fixed_rest_delay).max(floor)
    }

    /// Buy slippage percent, or `None` to let the swap client decide
    pub fn buy_slippage_pct(&self) -> Option<Decimal> {
        positive(self.buy_slippage)
    }

    /// Sell slippage percent, or `None` to let the swap client decide
    pub fn sell_slippage_pct(&self) -> Option<Decimal> {
        positive(self.sell_slippage)
    }

    /// Tip converted to a prioritization fee in lamports
    pub fn tip_lamports(&self) -> Option<u64> {
        positive(self.tip)
            .and_then(sol_to_lamports)
            .filter(|lamports| *lamports > 0)
    }
}

/// Per-user settings. The trading fields mirror [`AgentSettings`] and act as
/// the template for agents the user creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Mint of the traded token; empty disables trading
    pub token_address: String,
    /// External address for withdrawals from the root wallet
    pub withdraw_address: String,
    pub fixed_buy: Decimal,
    pub fixed_sell_delay: u64,
    pub fixed_rest_delay: u64,
    pub buy_slippage: Decimal,
    pub sell_slippage: Decimal,
    pub tip: Decimal,
    pub sell_enabled: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        let agent = AgentSettings::default();
        Self {
            token_address: String::new(),
            withdraw_address: String::new(),
            fixed_buy: agent.fixed_buy,
            fixed_sell_delay: agent.fixed_sell_delay,
            fixed_rest_delay: agent.fixed_rest_delay,
            buy_slippage: agent.buy_slippage,
            sell_slippage: agent.sell_slippage,
            tip: agent.tip,
            sell_enabled: agent.sell_enabled,
        }
    }
}

impl UserSettings {
    /// Settings a newly created agent starts from
    pub fn agent_defaults(&self) -> AgentSettings {
        AgentSettings {
            fixed_buy: self.fixed_buy,
            fixed_sell_delay: self.fixed_sell_delay,
            fixed_rest_delay: self.fixed_rest_delay,
            buy_slippage: self.buy_slippage,
            sell_slippage: self.sell_slippage,
            tip: self.tip,
            sell_enabled: self.sell_enabled,
        }
    }

    /// Target token mint, if one is set
    pub fn token(&self) -> Option<&str> {
        non_empty(&self.token_address)
    }

    /// Withdraw destination, if one is set
    pub fn withdraw_destination(&self) -> Option<&str> {
        non_empty(&self.withdraw_address)
    }
}

fn positive(value: Decimal) -> Option<Decimal> {
    (value > Decimal::ZERO).then_some(value)
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
