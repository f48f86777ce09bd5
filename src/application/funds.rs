//! Fund Transfer
//!
//! Plain SOL transfers between a user's root wallet, their agent wallets and
//! an external withdraw address. Multi-wallet operations are not atomic:
//! every wallet is attempted and gets its own report line. Completed
//! operations are forwarded to the notification sink when one is set.

use std::sync::Arc;

use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

use crate::adapters::solana::{parse_address, WalletError, WalletManager};
use crate::domain::{
    lamports_to_sol, sol_to_lamports, TransferOutcome, TransferReport, UserId, WalletRecord,
};
use crate::ports::{LedgerError, LedgerPort, Notifier, StoreError, TradeEvent, WalletStore};

#[derive(Debug, Error)]
pub enum FundsError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("No root wallet for user {0}")]
    NoRootWallet(UserId),
    #[error("Root wallet key could not be decoded: {0}")]
    RootKey(WalletError),
    #[error("No agent named {0}")]
    UnknownAgent(String),
    #[error("Agent wallet key could not be decoded: {0}")]
    AgentKey(WalletError),
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),
    #[error("Withdraw address not set")]
    NoWithdrawAddress,
    #[error("Invalid withdraw address: {0}")]
    InvalidWithdrawAddress(WalletError),
    #[error("Transfer failed: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FundsConfig {
    /// SOL left behind in each agent wallet by a sweep, to cover fees
    pub sweep_reserve: Decimal,
}

impl Default for FundsConfig {
    fn default() -> Self {
        Self {
            sweep_reserve: Decimal::new(1, 3),
        }
    }
}

/// Balance line for one stored wallet
#[derive(Debug, Clone, PartialEq)]
pub struct WalletBalance {
    pub label: String,
    pub pubkey: Option<Pubkey>,
    /// `None` when the key or the balance could not be read
    pub lamports: Option<u64>,
}

pub struct FundTransfer {
    store: Arc<dyn WalletStore>,
    ledger: Arc<dyn LedgerPort>,
    config: FundsConfig,
    notifier: Option<Arc<dyn Notifier>>,
}

impl FundTransfer {
    pub fn new(store: Arc<dyn WalletStore>, ledger: Arc<dyn LedgerPort>, config: FundsConfig) -> Self {
        Self {
            store,
            ledger,
            config,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    async fn notify(&self, user: &UserId, event: TradeEvent) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(user, &event.to_string()).await;
        }
    }

    /// Send `amount_per_agent` SOL from root to every agent wallet
    pub async fn distribute(
        &self,
        user: &UserId,
        amount_per_agent: Decimal,
    ) -> Result<TransferReport, FundsError> {
        let lamports = positive_lamports(amount_per_agent)?;
        let wallets = self.store.user_wallets(user).await?;
        let root = root_keypair(user, &wallets)?;

        let mut report = TransferReport::new();
        for record in wallets.iter().filter(|w| w.is_agent()) {
            let agent = match WalletManager::from_base58(&record.base58_key) {
                Ok(wallet) => wallet.pubkey(),
                Err(e) => {
                    tracing::error!("[Distribute] Key decode error for agent {}: {}", record.label(), e);
                    report.push(record.label(), TransferOutcome::KeyDecodeError);
                    continue;
                }
            };

            let outcome = self.send(&root, &agent, lamports).await;
            match &outcome {
                TransferOutcome::Sent { signature, .. } => tracing::info!(
                    "[Distribute] {} SOL sent from root to agent {}: {}",
                    amount_per_agent,
                    record.label(),
                    signature
                ),
                other => tracing::error!("[Distribute] Agent {}: {}", record.label(), other),
            }
            report.push(record.label(), outcome);
        }

        if report.is_empty() {
            tracing::info!("[Distribute] No agent wallets for user {}", user);
        }
        self.notify(
            user,
            TradeEvent::Distributed {
                amount_per_agent,
                report: report.clone(),
            },
        )
        .await;
        Ok(report)
    }

    /// Send `amount` SOL from root to one named agent; returns the signature
    pub async fn load_agent(
        &self,
        user: &UserId,
        agent_name: &str,
        amount: Decimal,
    ) -> Result<String, FundsError> {
        let lamports = positive_lamports(amount)?;
        let wallets = self.store.user_wallets(user).await?;
        let root = root_keypair(user, &wallets)?;

        let record = wallets
            .iter()
            .find(|w| w.is_agent() && w.agent_name.as_deref() == Some(agent_name))
            .ok_or_else(|| FundsError::UnknownAgent(agent_name.to_string()))?;
        let agent = WalletManager::from_base58(&record.base58_key).map_err(FundsError::AgentKey)?;

        let signature = self.transfer(&root, &agent.pubkey(), lamports).await?;
        tracing::info!("[Load] {} SOL sent from root to agent {}: {}", amount, agent_name, signature);
        self.notify(
            user,
            TradeEvent::AgentLoaded {
                agent: agent_name.to_string(),
                amount,
                signature: signature.clone(),
            },
        )
        .await;
        Ok(signature)
    }

    /// Move everything above the reserve from each agent back to root
    pub async fn sweep(
        &self,
        user: &UserId,
        reserve: Option<Decimal>,
    ) -> Result<TransferReport, FundsError> {
        let reserve = reserve.unwrap_or(self.config.sweep_reserve);
        let reserve_lamports = sol_to_lamports(reserve).ok_or(FundsError::InvalidAmount(reserve))?;

        let wallets = self.store.user_wallets(user).await?;
        let root = root_keypair(user, &wallets)?.pubkey();

        let mut report = TransferReport::new();
        for record in wallets.iter().filter(|w| w.is_agent()) {
            let outcome = self.sweep_one(record, &root, reserve_lamports).await;
            match &outcome {
                TransferOutcome::Sent { lamports, signature } => tracing::info!(
                    "[Collect] Collected {:.6} SOL from agent {} to root: {}",
                    lamports_to_sol(*lamports),
                    record.label(),
                    signature
                ),
                TransferOutcome::Insufficient { balance_lamports } => tracing::info!(
                    "[Collect] Agent {} has insufficient SOL: {:.6} SOL",
                    record.label(),
                    lamports_to_sol(*balance_lamports)
                ),
                other => tracing::error!("[Collect] Agent {}: {}", record.label(), other),
            }
            report.push(record.label(), outcome);
        }

        if report.is_empty() {
            tracing::info!("[Collect] No agent wallets for user {}", user);
        }
        self.notify(user, TradeEvent::Swept { report: report.clone() })
            .await;
        Ok(report)
    }

    async fn sweep_one(
        &self,
        record: &WalletRecord,
        root: &Pubkey,
        reserve_lamports: u64,
    ) -> TransferOutcome {
        let agent = match WalletManager::from_base58(&record.base58_key) {
            Ok(wallet) => wallet,
            Err(_) => return TransferOutcome::KeyDecodeError,
        };

        let balance = match self.ledger.get_balance(&agent.pubkey()).await {
            Ok(balance) => balance,
            Err(e) => return TransferOutcome::Failed(e.to_string()),
        };
        if balance <= reserve_lamports {
            return TransferOutcome::Insufficient {
                balance_lamports: balance,
            };
        }

        self.send(agent.keypair(), root, balance - reserve_lamports).await
    }

    /// Send `amount` SOL from root to the user's withdraw address
    pub async fn withdraw(&self, user: &UserId, amount: Decimal) -> Result<String, FundsError> {
        let settings = self.store.user_settings(user).await?;
        let destination = settings
            .withdraw_destination()
            .ok_or(FundsError::NoWithdrawAddress)?;
        let destination = parse_address(destination).map_err(FundsError::InvalidWithdrawAddress)?;
        let lamports = positive_lamports(amount)?;

        let wallets = self.store.user_wallets(user).await?;
        let root = root_keypair(user, &wallets)?;

        let signature = self.transfer(&root, &destination, lamports).await?;
        tracing::info!("[Withdraw] {} SOL sent from root to {}: {}", amount, destination, signature);
        self.notify(
            user,
            TradeEvent::Withdrawn {
                amount,
                destination: destination.to_string(),
                signature: signature.clone(),
            },
        )
        .await;
        Ok(signature)
    }

    /// SOL balance of every stored wallet, root first
    pub async fn balances(&self, user: &UserId) -> Result<Vec<WalletBalance>, FundsError> {
        let mut wallets = self.store.user_wallets(user).await?;
        wallets.sort_by_key(|w| (!w.is_root(), w.index));

        let mut balances = Vec::with_capacity(wallets.len());
        for record in &wallets {
            let pubkey = WalletManager::from_base58(&record.base58_key)
                .ok()
                .map(|w| w.pubkey());
            let lamports = match pubkey {
                Some(pubkey) => self.ledger.get_balance(&pubkey).await.ok(),
                None => None,
            };
            balances.push(WalletBalance {
                label: record.label().to_string(),
                pubkey,
                lamports,
            });
        }
        Ok(balances)
    }

    async fn send(&self, from: &Keypair, to: &Pubkey, lamports: u64) -> TransferOutcome {
        match self.transfer(from, to, lamports).await {
            Ok(signature) => TransferOutcome::Sent {
                lamports,
                signature,
            },
            Err(e) => TransferOutcome::Failed(e.to_string()),
        }
    }

    /// Build, sign and submit a single system transfer
    async fn transfer(&self, from: &Keypair, to: &Pubkey, lamports: u64) -> Result<String, LedgerError> {
        let blockhash = self.ledger.get_latest_blockhash().await?;
        let instruction = system_instruction::transfer(&from.pubkey(), to, lamports);
        let transaction =
            Transaction::new_signed_with_payer(&[instruction], Some(&from.pubkey()), &[from], blockhash);
        self.ledger.submit_transaction(&transaction).await
    }
}

fn positive_lamports(amount: Decimal) -> Result<u64, FundsError> {
    sol_to_lamports(amount)
        .filter(|lamports| *lamports > 0)
        .ok_or(FundsError::InvalidAmount(amount))
}

fn root_keypair(user: &UserId, wallets: &[WalletRecord]) -> Result<Keypair, FundsError> {
    let root = wallets
        .iter()
        .find(|w| w.is_root())
        .ok_or_else(|| FundsError::NoRootWallet(user.clone()))?;
    WalletManager::from_base58(&root.base58_key)
        .map(WalletManager::into_keypair)
        .map_err(FundsError::RootKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_reserve() {
        assert_eq!(FundsConfig::default().sweep_reserve, dec!(0.001));
    }

    #[test]
    fn test_positive_lamports() {
        assert_eq!(positive_lamports(dec!(0.5)).unwrap(), 500_000_000);
        assert!(matches!(positive_lamports(Decimal::ZERO), Err(FundsError::InvalidAmount(_))));
        assert!(matches!(positive_lamports(dec!(-1)), Err(FundsError::InvalidAmount(_))));
    }

    #[test]
    fn test_root_keypair_lookup() {
        let user = UserId::new("1");
        assert!(matches!(
            root_keypair(&user, &[WalletRecord::agent(1, "k", "a")]),
            Err(FundsError::NoRootWallet(_))
        ));
        assert!(matches!(
            root_keypair(&user, &[WalletRecord::root(0, "garbage!")]),
            Err(FundsError::RootKey(_))
        ));

        let root = WalletManager::new_random();
        let found = root_keypair(&user, &[WalletRecord::root(0, root.to_base58())]).unwrap();
        assert_eq!(found.pubkey(), root.pubkey());
    }
}
