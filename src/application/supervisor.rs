//! Trading Supervisor
//!
//! Owns one task group per user. Enabling trading resolves the user's token
//! and agent wallets and spawns a [`CycleController`] per agent, staggered so
//! the agents do not hit the aggregator at the same instant. Disabling clears
//! the user's flag and waits for every controller to reach its next
//! settings check and exit. The group stays registered while it drains, so
//! a user cannot be re-enabled until the old controllers are gone.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinSet};

use crate::adapters::solana::WalletManager;
use crate::domain::{AgentKey, AgentWallet, UserId};
use crate::ports::{StoreError, TradeEvent};

use super::cycle::{CycleConfig, CycleController, CycleSummary};
use super::services::Services;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Trading already running for user {0}")]
    AlreadyRunning(UserId),
    #[error("Trading not running for user {0}")]
    NotRunning(UserId),
    #[error("Trading is still stopping for user {0}")]
    Stopping(UserId),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

struct UserGroup {
    tasks: JoinSet<(String, CycleSummary)>,
    agents: Vec<(String, AbortHandle)>,
    /// Set once a stop has taken the task set; cleared by removal
    stopping: bool,
}

impl UserGroup {
    /// Mark the group stopping and hand its task set to the caller
    fn begin_stop(&mut self, user: &UserId) -> Result<JoinSet<(String, CycleSummary)>, SupervisorError> {
        if self.stopping {
            return Err(SupervisorError::Stopping(user.clone()));
        }
        self.stopping = true;
        Ok(std::mem::take(&mut self.tasks))
    }
}

pub struct TradingSupervisor {
    services: Services,
    cycle: CycleConfig,
    stagger: Duration,
    groups: Mutex<HashMap<UserId, UserGroup>>,
}

impl TradingSupervisor {
    pub fn new(services: Services, cycle: CycleConfig, stagger: Duration) -> Self {
        Self {
            services,
            cycle,
            stagger,
            groups: Mutex::new(HashMap::new()),
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Start one controller per agent wallet. Returns how many were spawned;
    /// zero when the user has no token or no usable agent wallets.
    pub async fn enable_trading(&self, user: &UserId) -> Result<usize, SupervisorError> {
        let mut groups = self.groups.lock().await;
        match groups.get(user) {
            Some(group) if group.stopping => return Err(SupervisorError::Stopping(user.clone())),
            Some(_) => return Err(SupervisorError::AlreadyRunning(user.clone())),
            None => {}
        }

        let settings = self.services.store.user_settings(user).await?;
        let Some(token) = settings.token().map(str::to_string) else {
            tracing::info!("No token set for user {}", user);
            return Ok(0);
        };

        let wallets = self.agent_wallets(user).await?;
        if wallets.is_empty() {
            tracing::info!("No agent wallets for user {}", user);
            return Ok(0);
        }

        self.services.state.set_active(user, true);

        let mut group = UserGroup {
            tasks: JoinSet::new(),
            agents: Vec::with_capacity(wallets.len()),
            stopping: false,
        };
        for (i, wallet) in wallets.into_iter().enumerate() {
            let agent = wallet.key.agent.clone();
            let delay = self.stagger.saturating_mul(i as u32);
            let controller =
                CycleController::new(wallet, token.clone(), self.services.clone(), self.cycle.clone());
            let name = agent.clone();

            let handle = group.tasks.spawn(async move {
                tokio::time::sleep(delay).await;
                (name, controller.run().await)
            });
            group.agents.push((agent, handle));
        }

        let count = group.agents.len();
        groups.insert(user.clone(), group);
        drop(groups);

        tracing::info!("Trading enabled for user {} with {} agent(s) on {}", user, count, token);
        self.services
            .notify(user, TradeEvent::TradingStarted { agents: count })
            .await;
        Ok(count)
    }

    /// Clear the user's flag and wait for every controller to exit
    pub async fn disable_trading(
        &self,
        user: &UserId,
    ) -> Result<Vec<(String, CycleSummary)>, SupervisorError> {
        let mut tasks = {
            let mut groups = self.groups.lock().await;
            let group = groups
                .get_mut(user)
                .ok_or_else(|| SupervisorError::NotRunning(user.clone()))?;
            let tasks = group.begin_stop(user)?;
            self.services.state.set_active(user, false);
            tasks
        };

        tracing::info!("Stopping {} controller(s) for user {}", tasks.len(), user);
        let mut summaries = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => summaries.push(result),
                Err(e) => tracing::error!("Controller for user {} ended abnormally: {}", user, e),
            }
        }
        summaries.sort_by(|a, b| a.0.cmp(&b.0));
        self.groups.lock().await.remove(user);

        self.services.notify(user, TradeEvent::TradingStopped).await;
        Ok(summaries)
    }

    /// Cancel every controller immediately, mid-swap or mid-wait.
    /// Returns how many were cancelled. On a user that is already stopping
    /// this cancels the controllers the pending stop is waiting on.
    pub async fn abort_trading(&self, user: &UserId) -> Result<usize, SupervisorError> {
        let mut tasks = {
            let mut groups = self.groups.lock().await;
            let group = groups
                .get_mut(user)
                .ok_or_else(|| SupervisorError::NotRunning(user.clone()))?;
            self.services.state.set_active(user, false);

            let count = group.agents.len();
            if group.stopping {
                for (_, handle) in &group.agents {
                    handle.abort();
                }
                tracing::warn!("Aborted {} stopping controller(s) for user {}", count, user);
                return Ok(count);
            }
            group.begin_stop(user)?
        };

        let count = tasks.len();
        tasks.shutdown().await;
        self.groups.lock().await.remove(user);
        tracing::warn!("Aborted {} controller(s) for user {}", count, user);

        self.services.notify(user, TradeEvent::TradingStopped).await;
        Ok(count)
    }

    /// Names of the user's controllers that are still running
    pub async fn running_agents(&self, user: &UserId) -> Vec<String> {
        self.groups
            .lock()
            .await
            .get(user)
            .map(|group| {
                group
                    .agents
                    .iter()
                    .filter(|(_, handle)| !handle.is_finished())
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True while the user's controllers run and no stop is pending
    pub async fn is_trading(&self, user: &UserId) -> bool {
        self.groups
            .lock()
            .await
            .get(user)
            .is_some_and(|group| !group.stopping)
    }

    pub async fn is_stopping(&self, user: &UserId) -> bool {
        self.groups
            .lock()
            .await
            .get(user)
            .is_some_and(|group| group.stopping)
    }

    /// Stop every user gracefully. Users already stopping are left to the
    /// stop in flight.
    pub async fn shutdown(&self) -> HashMap<UserId, Vec<(String, CycleSummary)>> {
        let users: Vec<UserId> = self
            .groups
            .lock()
            .await
            .iter()
            .filter(|(_, group)| !group.stopping)
            .map(|(user, _)| user.clone())
            .collect();
        let mut results = HashMap::new();
        for user in users {
            if let Ok(summaries) = self.disable_trading(&user).await {
                results.insert(user, summaries);
            }
        }
        results
    }

    /// Decode the user's agent wallets; undecodable keys are logged and skipped
    async fn agent_wallets(&self, user: &UserId) -> Result<Vec<AgentWallet>, StoreError> {
        let records = self.services.store.user_wallets(user).await?;

        let wallets = records
            .into_iter()
            .filter(|record| record.is_agent())
            .filter_map(|record| match WalletManager::from_base58(&record.base58_key) {
                Ok(wallet) => Some(AgentWallet::new(
                    AgentKey::new(user.clone(), record.label()),
                    record.index,
                    Arc::new(wallet.into_keypair()),
                )),
                Err(e) => {
                    tracing::error!(
                        "Error decoding agent wallet key for {} (user {}): {}",
                        record.label(),
                        user,
                        e
                    );
                    None
                }
            })
            .collect();
        Ok(wallets)
    }
}
