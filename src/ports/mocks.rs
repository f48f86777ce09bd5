//! Recording test doubles for the ports.
//!
//! Each mock records every call and returns scripted responses, so tests can
//! assert on what the trading loop and fund operations actually sent.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction::SystemInstruction;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;
use tokio::time::Instant;

use super::ledger::{LedgerError, LedgerPort, SendOptions};
use super::notifier::Notifier;
use super::swap::{BuyFill, SwapOptions, SwapPort};
use crate::domain::{TradeError, UserId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A decoded system transfer seen by [`MockLedger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransfer {
    pub from: Pubkey,
    pub to: Pubkey,
    pub lamports: u64,
}

/// In-memory ledger that applies system transfers to its balance table
#[derive(Debug)]
pub struct MockLedger {
    balances: Mutex<HashMap<Pubkey, u64>>,
    blockhash: Hash,
    submitted: Mutex<Vec<Transaction>>,
    raw: Mutex<Vec<(Vec<u8>, SendOptions)>>,
    failing_destinations: Mutex<HashSet<Pubkey>>,
    balance_errors: Mutex<HashSet<Pubkey>>,
    balance_calls: Mutex<Vec<Pubkey>>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            blockhash: Hash::new_unique(),
            submitted: Mutex::new(Vec::new()),
            raw: Mutex::new(Vec::new()),
            failing_destinations: Mutex::new(HashSet::new()),
            balance_errors: Mutex::new(HashSet::new()),
            balance_calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to seed a balance
    pub fn with_balance(self, pubkey: Pubkey, lamports: u64) -> Self {
        self.set_balance(pubkey, lamports);
        self
    }

    pub fn set_balance(&self, pubkey: Pubkey, lamports: u64) {
        lock(&self.balances).insert(pubkey, lamports);
    }

    pub fn balance(&self, pubkey: &Pubkey) -> u64 {
        lock(&self.balances).get(pubkey).copied().unwrap_or(0)
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    /// Transfers to `pubkey` will be rejected
    pub fn fail_transfers_to(&self, pubkey: Pubkey) {
        lock(&self.failing_destinations).insert(pubkey);
    }

    /// Balance reads for `pubkey` will fail
    pub fn fail_balance_of(&self, pubkey: Pubkey) {
        lock(&self.balance_errors).insert(pubkey);
    }

    pub fn submitted(&self) -> Vec<Transaction> {
        lock(&self.submitted).clone()
    }

    pub fn raw_sent(&self) -> Vec<(Vec<u8>, SendOptions)> {
        lock(&self.raw).clone()
    }

    pub fn balance_calls(&self) -> Vec<Pubkey> {
        lock(&self.balance_calls).clone()
    }

    /// Successful system transfers, in submission order
    pub fn transfers(&self) -> Vec<RecordedTransfer> {
        lock(&self.submitted)
            .iter()
            .filter_map(decode_transfer)
            .collect()
    }
}

fn decode_transfer(tx: &Transaction) -> Option<RecordedTransfer> {
    let message = &tx.message;
    let ix = message.instructions.first()?;
    let program = message.account_keys.get(ix.program_id_index as usize)?;
    if *program != system_program::id() {
        return None;
    }
    let SystemInstruction::Transfer { lamports } = bincode::deserialize(&ix.data).ok()? else {
        return None;
    };
    let from = *message.account_keys.get(*ix.accounts.first()? as usize)?;
    let to = *message.account_keys.get(*ix.accounts.get(1)? as usize)?;
    Some(RecordedTransfer { from, to, lamports })
}

#[async_trait]
impl LedgerPort for MockLedger {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, LedgerError> {
        lock(&self.balance_calls).push(*pubkey);
        if lock(&self.balance_errors).contains(pubkey) {
            return Err(LedgerError::RpcError("balance unavailable".to_string()));
        }
        Ok(self.balance(pubkey))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        Ok(self.blockhash)
    }

    async fn submit_transaction(&self, transaction: &Transaction) -> Result<String, LedgerError> {
        if let Some(transfer) = decode_transfer(transaction) {
            if lock(&self.failing_destinations).contains(&transfer.to) {
                return Err(LedgerError::TransactionError(
                    "destination rejected".to_string(),
                ));
            }
            let mut balances = lock(&self.balances);
            let from = balances.entry(transfer.from).or_insert(0);
            if *from < transfer.lamports {
                return Err(LedgerError::TransactionError(
                    "insufficient funds".to_string(),
                ));
            }
            *from -= transfer.lamports;
            *balances.entry(transfer.to).or_insert(0) += transfer.lamports;
        }
        lock(&self.submitted).push(transaction.clone());
        Ok(transaction.signatures[0].to_string())
    }

    async fn send_raw_transaction(
        &self,
        raw: Vec<u8>,
        options: SendOptions,
    ) -> Result<String, LedgerError> {
        let mut sent = lock(&self.raw);
        sent.push((raw, options));
        Ok(format!("raw-sig-{}", sent.len()))
    }
}

/// A swap call recorded by [`ScriptedSwap`]
#[derive(Debug, Clone, PartialEq)]
pub enum SwapCall {
    Buy {
        wallet: Pubkey,
        token: String,
        amount_sol: Decimal,
        options: SwapOptions,
    },
    Sell {
        wallet: Pubkey,
        token: String,
        amount: u64,
        options: SwapOptions,
    },
}

impl SwapCall {
    pub fn is_buy(&self) -> bool {
        matches!(self, SwapCall::Buy { .. })
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, SwapCall::Sell { .. })
    }

    pub fn wallet(&self) -> Pubkey {
        match self {
            SwapCall::Buy { wallet, .. } | SwapCall::Sell { wallet, .. } => *wallet,
        }
    }
}

/// Swap port that replays queued results, then falls back to a default fill
#[derive(Debug)]
pub struct ScriptedSwap {
    buys: Mutex<VecDeque<Result<BuyFill, TradeError>>>,
    sells: Mutex<VecDeque<Result<String, TradeError>>>,
    default_out_amount: u64,
    calls: Mutex<Vec<SwapCall>>,
    buy_times: Mutex<Vec<(Pubkey, Instant)>>,
}

impl Default for ScriptedSwap {
    fn default() -> Self {
        Self {
            buys: Mutex::new(VecDeque::new()),
            sells: Mutex::new(VecDeque::new()),
            default_out_amount: 1_000,
            calls: Mutex::new(Vec::new()),
            buy_times: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedSwap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output amount reported by unscripted buys
    pub fn with_default_out_amount(mut self, amount: u64) -> Self {
        self.default_out_amount = amount;
        self
    }

    pub fn push_buy(&self, result: Result<BuyFill, TradeError>) {
        lock(&self.buys).push_back(result);
    }

    pub fn push_sell(&self, result: Result<String, TradeError>) {
        lock(&self.sells).push_back(result);
    }

    pub fn calls(&self) -> Vec<SwapCall> {
        lock(&self.calls).clone()
    }

    pub fn calls_for(&self, wallet: &Pubkey) -> Vec<SwapCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.wallet() == *wallet)
            .collect()
    }

    pub fn buy_count(&self) -> usize {
        lock(&self.calls).iter().filter(|c| c.is_buy()).count()
    }

    pub fn sell_count(&self) -> usize {
        lock(&self.calls).iter().filter(|c| c.is_sell()).count()
    }

    /// When `wallet` first asked for a buy, on the tokio clock
    pub fn first_buy_at(&self, wallet: &Pubkey) -> Option<Instant> {
        lock(&self.buy_times)
            .iter()
            .find(|(w, _)| w == wallet)
            .map(|(_, at)| *at)
    }
}

#[async_trait]
impl SwapPort for ScriptedSwap {
    async fn buy(
        &self,
        signer: &Keypair,
        token: &str,
        amount_sol: Decimal,
        options: &SwapOptions,
    ) -> Result<BuyFill, TradeError> {
        lock(&self.buy_times).push((signer.pubkey(), Instant::now()));
        let n = {
            let mut calls = lock(&self.calls);
            calls.push(SwapCall::Buy {
                wallet: signer.pubkey(),
                token: token.to_string(),
                amount_sol,
                options: options.clone(),
            });
            calls.len()
        };
        lock(&self.buys).pop_front().unwrap_or_else(|| {
            Ok(BuyFill {
                signature: format!("buy-sig-{}", n),
                out_amount: self.default_out_amount,
            })
        })
    }

    async fn sell(
        &self,
        signer: &Keypair,
        token: &str,
        amount: u64,
        options: &SwapOptions,
    ) -> Result<String, TradeError> {
        let n = {
            let mut calls = lock(&self.calls);
            calls.push(SwapCall::Sell {
                wallet: signer.pubkey(),
                token: token.to_string(),
                amount,
                options: options.clone(),
            });
            calls.len()
        };
        lock(&self.sells)
            .pop_front()
            .unwrap_or_else(|| Ok(format!("sell-sig-{}", n)))
    }
}

/// Notifier that keeps every message
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(UserId, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(UserId, String)> {
        lock(&self.messages).clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        lock(&self.messages).iter().any(|(_, m)| m.contains(needle))
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user: &UserId, message: &str) {
        lock(&self.messages).push((user.clone(), message.to_string()));
    }
}
