use std::fmt;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{TransferReport, UserId};

/// Events surfaced to the user through a notification sink
#[derive(Debug, Clone, PartialEq)]
pub enum TradeEvent {
    TradingStarted { agents: usize },
    TradingStopped,
    Bought {
        agent: String,
        amount_sol: Decimal,
        out_amount: u64,
        signature: String,
    },
    Sold {
        agent: String,
        amount: u64,
        signature: String,
    },
    SellAbandoned {
        agent: String,
        amount: u64,
        attempts: u32,
    },
    Distributed {
        amount_per_agent: Decimal,
        report: TransferReport,
    },
    Swept {
        report: TransferReport,
    },
    AgentLoaded {
        agent: String,
        amount: Decimal,
        signature: String,
    },
    Withdrawn {
        amount: Decimal,
        destination: String,
        signature: String,
    },
}

impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeEvent::TradingStarted { agents } => {
                write!(f, "Trading started with {} agent(s)", agents)
            }
            TradeEvent::TradingStopped => f.write_str("Trading stopped"),
            TradeEvent::Bought {
                agent,
                amount_sol,
                out_amount,
                signature,
            } => write!(
                f,
                "[{}] Bought {} tokens for {} SOL (tx {})",
                agent, out_amount, amount_sol, signature
            ),
            TradeEvent::Sold {
                agent,
                amount,
                signature,
            } => write!(f, "[{}] Sold {} tokens (tx {})", agent, amount, signature),
            TradeEvent::SellAbandoned {
                agent,
                amount,
                attempts,
            } => write!(
                f,
                "[{}] Gave up selling {} tokens after {} failed attempts",
                agent, amount, attempts
            ),
            TradeEvent::Distributed {
                amount_per_agent,
                report,
            } => write!(
                f,
                "Distributed {} SOL per agent ({} ok, {} failed)\n{}",
                amount_per_agent,
                report.succeeded(),
                report.failed(),
                report
            ),
            TradeEvent::Swept { report } => write!(
                f,
                "Collected {:.6} SOL from agents\n{}",
                report.total_sol(),
                report
            ),
            TradeEvent::AgentLoaded {
                agent,
                amount,
                signature,
            } => write!(f, "[{}] Loaded {} SOL from root (tx {})", agent, amount, signature),
            TradeEvent::Withdrawn {
                amount,
                destination,
                signature,
            } => write!(
                f,
                "Withdrew {} SOL to {} (tx {})",
                amount, destination, signature
            ),
        }
    }
}

/// Sink for human-readable event strings. Delivery failures are the sink's
/// problem; they never reach the trading loop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: &UserId, message: &str);
}
