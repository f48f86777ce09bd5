//! Fund Transfer Reports
//!
//! Per-wallet outcomes of distribute/sweep/withdraw. Every wallet gets its
//! own line; one wallet failing never hides the others.

use std::fmt;

use rust_decimal::Decimal;

use super::units::lamports_to_sol;

#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// Transfer submitted
    Sent { lamports: u64, signature: String },
    /// Balance at or below what must stay in the wallet
    Insufficient { balance_lamports: u64 },
    /// Stored key could not be decoded; wallet skipped
    KeyDecodeError,
    /// Submission or balance read failed
    Failed(String),
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Sent { .. })
    }

    /// SOL moved, zero unless sent
    pub fn sol_moved(&self) -> Decimal {
        match self {
            TransferOutcome::Sent { lamports, .. } => lamports_to_sol(*lamports),
            _ => Decimal::ZERO,
        }
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferOutcome::Sent { lamports, .. } => {
                write!(f, "{:.6} SOL", lamports_to_sol(*lamports))
            }
            TransferOutcome::Insufficient { .. } => f.write_str("Insufficient balance"),
            TransferOutcome::KeyDecodeError => f.write_str("Key decode error"),
            TransferOutcome::Failed(reason) => write!(f, "Transfer failed ({})", reason),
        }
    }
}

/// Outcome for one named wallet
#[derive(Debug, Clone, PartialEq)]
pub struct WalletOutcome {
    pub wallet: String,
    pub outcome: TransferOutcome,
}

impl fmt::Display for WalletOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent {}: {}", self.wallet, self.outcome)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferReport {
    pub lines: Vec<WalletOutcome>,
}

impl TransferReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, wallet: impl Into<String>, outcome: TransferOutcome) {
        self.lines.push(WalletOutcome {
            wallet: wallet.into(),
            outcome,
        });
    }

    pub fn succeeded(&self) -> usize {
        self.lines.iter().filter(|l| l.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| {
                matches!(
                    l.outcome,
                    TransferOutcome::Failed(_) | TransferOutcome::KeyDecodeError
                )
            })
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l.outcome, TransferOutcome::Insufficient { .. }))
            .count()
    }

    pub fn total_sol(&self) -> Decimal {
        self.lines.iter().map(|l| l.outcome.sol_moved()).sum()
    }

    pub fn outcome_for(&self, wallet: &str) -> Option<&TransferOutcome> {
        self.lines
            .iter()
            .find(|l| l.wallet == wallet)
            .map(|l| &l.outcome)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lines.is_empty() {
            return f.write_str("No Agent Wallets found.");
        }
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", line)?;
        }
        Ok(())
    }
}
