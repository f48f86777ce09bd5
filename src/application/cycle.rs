//! Cycle Controller
//!
//! One controller per (user, agent). It loops
//! `CheckSettings -> CheckBalance -> Buying -> Holding -> Selling -> Resting`
//! until the user's active flag is cleared. The flag is only consulted at
//! `CheckSettings`, so a stop never interrupts a swap or a wait in progress.
//!
//! Failures are logged and turned into waits; nothing a collaborator returns
//! ends the loop.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{AgentSettings, AgentWallet, lamports_to_sol};
use crate::ports::{SwapOptions, TradeEvent};

use super::services::Services;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    CheckSettings,
    CheckBalance,
    Buying,
    Holding,
    Selling,
    Resting,
    Stopped,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleState::CheckSettings => "CheckSettings",
            CycleState::CheckBalance => "CheckBalance",
            CycleState::Buying => "Buying",
            CycleState::Holding => "Holding",
            CycleState::Selling => "Selling",
            CycleState::Resting => "Resting",
            CycleState::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Timing and retry knobs for the cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleConfig {
    /// Wait after unusable settings or an underfunded wallet
    pub settings_poll: Duration,
    /// Wait after a failed buy
    pub buy_retry: Duration,
    /// Lower bound for the rest between cycles
    pub min_rest: Duration,
    /// Consecutive failed sells before a position is abandoned
    pub max_sell_retries: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            settings_poll: Duration::from_secs(5),
            buy_retry: Duration::from_secs(1),
            min_rest: Duration::from_secs(1),
            max_sell_retries: 3,
        }
    }
}

/// What a controller did over its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub buys: u32,
    pub failed_buys: u32,
    pub sells: u32,
    pub failed_sells: u32,
    pub abandoned: u32,
}

pub struct CycleController {
    wallet: AgentWallet,
    token: String,
    services: Services,
    active: Arc<AtomicBool>,
    config: CycleConfig,
    settings: AgentSettings,
    summary: CycleSummary,
}

impl CycleController {
    pub fn new(
        wallet: AgentWallet,
        token: impl Into<String>,
        services: Services,
        config: CycleConfig,
    ) -> Self {
        let active = services.state.active_flag(&wallet.key.user);
        Self {
            wallet,
            token: token.into(),
            services,
            active,
            config,
            settings: AgentSettings::default(),
            summary: CycleSummary::default(),
        }
    }

    pub fn summary(&self) -> &CycleSummary {
        &self.summary
    }

    /// Drive the state machine until the user is deactivated
    pub async fn run(mut self) -> CycleSummary {
        tracing::info!("[{}] Cycle started for wallet {}", self.wallet.key, self.wallet.pubkey());

        let mut state = CycleState::CheckSettings;
        while state != CycleState::Stopped {
            let next = self.step(state).await;
            tracing::debug!("[{}] {} -> {}", self.wallet.key, state, next);
            state = next;
        }

        tracing::info!("[{}] Cycle stopped: {:?}", self.wallet.key, self.summary);
        self.summary
    }

    /// Execute one state and return the next
    pub async fn step(&mut self, state: CycleState) -> CycleState {
        match state {
            CycleState::CheckSettings => self.check_settings().await,
            CycleState::CheckBalance => self.check_balance().await,
            CycleState::Buying => self.buy().await,
            CycleState::Holding => {
                tokio::time::sleep(self.settings.sell_delay()).await;
                CycleState::Selling
            }
            CycleState::Selling => self.sell().await,
            CycleState::Resting => {
                tokio::time::sleep(self.settings.rest_delay(self.config.min_rest)).await;
                CycleState::CheckSettings
            }
            CycleState::Stopped => CycleState::Stopped,
        }
    }

    async fn check_settings(&mut self) -> CycleState {
        if !self.active.load(Ordering::SeqCst) {
            return CycleState::Stopped;
        }

        let key = &self.wallet.key;
        self.settings = match self.services.store.agent_settings(&key.user, &key.agent).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("[{}] Could not load settings: {}", key, e);
                tokio::time::sleep(self.config.settings_poll).await;
                return CycleState::CheckSettings;
            }
        };
        tracing::debug!("[{}] Settings: {:?}", key, self.settings);

        // A position left by a failed sell goes out before anything new is bought
        if self.settings.sell_enabled && self.services.state.pending(key).is_some() {
            tracing::info!("[{}] Retrying pending sell before next buy", key);
            return CycleState::Selling;
        }

        if self.settings.fixed_buy_lamports().is_none() {
            tracing::error!("[{}] Fixed buy amount not set", key);
            tokio::time::sleep(self.config.settings_poll).await;
            return CycleState::CheckSettings;
        }

        CycleState::CheckBalance
    }

    async fn check_balance(&mut self) -> CycleState {
        let required = self.settings.fixed_buy_lamports().unwrap_or(u64::MAX);

        match self.services.ledger.get_balance(&self.wallet.pubkey()).await {
            Ok(balance) if balance >= required => {
                tracing::debug!(
                    "[{}] Balance {:.4} SOL",
                    self.wallet.key,
                    lamports_to_sol(balance)
                );
                CycleState::Buying
            }
            Ok(balance) => {
                tracing::info!(
                    "[{}] Insufficient SOL (balance {:.4} SOL), waiting for funds",
                    self.wallet.key,
                    lamports_to_sol(balance)
                );
                tokio::time::sleep(self.config.settings_poll).await;
                CycleState::CheckSettings
            }
            Err(e) => {
                tracing::warn!("[{}] Balance check failed: {}", self.wallet.key, e);
                tokio::time::sleep(self.config.settings_poll).await;
                CycleState::CheckSettings
            }
        }
    }

    async fn buy(&mut self) -> CycleState {
        let options = SwapOptions {
            slippage_pct: self.settings.buy_slippage_pct(),
            priority_fee_lamports: self.settings.tip_lamports(),
        };
        let amount_sol = self.settings.fixed_buy;
        let key = &self.wallet.key;

        let fill = match self
            .services
            .swap
            .buy(self.wallet.keypair(), &self.token, amount_sol, &options)
            .await
        {
            Ok(fill) => fill,
            Err(e) => {
                tracing::error!("[{}] Buy failed: {}", key, e);
                self.summary.failed_buys += 1;
                tokio::time::sleep(self.config.buy_retry).await;
                return CycleState::CheckSettings;
            }
        };

        tracing::info!("[{}] Buy executed: {}", key, fill.signature);
        self.summary.buys += 1;
        if !self
            .services
            .state
            .record_buy(key, fill.out_amount, &fill.signature)
        {
            tracing::warn!("[{}] Buy reported zero output, nothing to sell", key);
        }
        self.services
            .notify(
                &key.user,
                TradeEvent::Bought {
                    agent: key.agent.clone(),
                    amount_sol,
                    out_amount: fill.out_amount,
                    signature: fill.signature,
                },
            )
            .await;

        if self.settings.sell_enabled {
            CycleState::Holding
        } else {
            tracing::info!("[{}] Sell disabled, skipping sell", key);
            CycleState::Resting
        }
    }

    async fn sell(&mut self) -> CycleState {
        let key = &self.wallet.key;
        let Some(position) = self.services.state.pending(key) else {
            tracing::info!("[{}] No stored buy amount, skipping sell", key);
            return CycleState::Resting;
        };

        let options = SwapOptions {
            slippage_pct: self.settings.sell_slippage_pct(),
            priority_fee_lamports: self.settings.tip_lamports(),
        };

        match self
            .services
            .swap
            .sell(self.wallet.keypair(), &self.token, position.amount, &options)
            .await
        {
            Ok(signature) => {
                tracing::info!("[{}] Sell executed: {}", key, signature);
                self.services.state.clear(key);
                self.summary.sells += 1;
                self.services
                    .notify(
                        &key.user,
                        TradeEvent::Sold {
                            agent: key.agent.clone(),
                            amount: position.amount,
                            signature,
                        },
                    )
                    .await;
            }
            Err(e) => {
                self.summary.failed_sells += 1;
                let failures = self.services.state.record_sell_failure(key);
                if failures >= self.config.max_sell_retries {
                    tracing::error!(
                        "[{}] Sell failed {} times, abandoning {} tokens: {}",
                        key,
                        failures,
                        position.amount,
                        e
                    );
                    self.services.state.clear(key);
                    self.summary.abandoned += 1;
                    self.services
                        .notify(
                            &key.user,
                            TradeEvent::SellAbandoned {
                                agent: key.agent.clone(),
                                amount: position.amount,
                                attempts: failures,
                            },
                        )
                        .await;
                } else {
                    tracing::error!(
                        "[{}] Sell failed ({}/{}), position kept: {}",
                        key,
                        failures,
                        self.config.max_sell_retries,
                        e
                    );
                }
            }
        }

        CycleState::Resting
    }
}
