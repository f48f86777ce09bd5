//! Shared Trade State
//!
//! Process-wide record of open positions, keyed by (user, agent), and the
//! per-user active-trading flags. One instance is created at startup and
//! injected into every controller and into the fund/command layer.
//!
//! Each position entry has exactly one writer: the controller owning that
//! agent. The flags are read atomically once per cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::identity::{AgentKey, UserId};

/// Output of the last successful buy, awaiting its sell
#[derive(Debug, Clone, PartialEq)]
pub struct TradeState {
    /// Token amount in smallest units, as reported by the quote
    pub amount: u64,
    /// Signature of the buy transaction
    pub signature: String,
    pub bought_at: DateTime<Utc>,
    /// Consecutive sell failures for this position
    pub failed_sells: u32,
}

impl TradeState {
    pub fn new(amount: u64, signature: impl Into<String>) -> Self {
        Self {
            amount,
            signature: signature.into(),
            bought_at: Utc::now(),
            failed_sells: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct SharedState {
    positions: DashMap<AgentKey, TradeState>,
    active: DashMap<UserId, Arc<AtomicBool>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the output of a buy. Zero amounts are never stored.
    pub fn record_buy(&self, key: &AgentKey, amount: u64, signature: &str) -> bool {
        if amount == 0 {
            return false;
        }
        self.positions
            .insert(key.clone(), TradeState::new(amount, signature));
        true
    }

    /// Position awaiting a sell, if one with a positive amount exists
    pub fn pending(&self, key: &AgentKey) -> Option<TradeState> {
        self.positions
            .get(key)
            .filter(|entry| entry.amount > 0)
            .map(|entry| entry.clone())
    }

    /// Count a failed sell against the position; returns the new failure count
    pub fn record_sell_failure(&self, key: &AgentKey) -> u32 {
        match self.positions.get_mut(key) {
            Some(mut entry) => {
                entry.failed_sells += 1;
                entry.failed_sells
            }
            None => 0,
        }
    }

    /// Drop the position (after a sell, or when it is abandoned)
    pub fn clear(&self, key: &AgentKey) -> Option<TradeState> {
        self.positions.remove(key).map(|(_, state)| state)
    }

    /// All open positions for one user, sorted by agent name
    pub fn positions_for(&self, user: &UserId) -> Vec<(String, TradeState)> {
        let mut positions: Vec<_> = self
            .positions
            .iter()
            .filter(|entry| &entry.key().user == user)
            .map(|entry| (entry.key().agent.clone(), entry.value().clone()))
            .collect();
        positions.sort_by(|a, b| a.0.cmp(&b.0));
        positions
    }

    /// Flag handle for a user, created (inactive) on first use
    pub fn active_flag(&self, user: &UserId) -> Arc<AtomicBool> {
        self.active
            .entry(user.clone())
            .or_insert_with(|| Arc::new(AtomicBool::new(false)))
            .clone()
    }

    pub fn set_active(&self, user: &UserId, active: bool) {
        self.active_flag(user).store(active, Ordering::SeqCst);
    }

    pub fn is_active(&self, user: &UserId) -> bool {
        self.active
            .get(user)
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}
