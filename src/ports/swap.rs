use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_sdk::signature::Keypair;

use crate::domain::TradeError;

/// Per-call overrides for a swap
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwapOptions {
    /// Slippage percent; `None` uses the client default
    pub slippage_pct: Option<Decimal>,
    /// Prioritization fee attached to the swap transaction
    pub priority_fee_lamports: Option<u64>,
}

/// A filled buy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyFill {
    pub signature: String,
    /// Token amount received, in smallest units
    pub out_amount: u64,
}

/// Buy and sell a token against SOL
#[async_trait]
pub trait SwapPort: Send + Sync {
    /// Spend `amount_sol` SOL on `token`
    async fn buy(
        &self,
        signer: &Keypair,
        token: &str,
        amount_sol: Decimal,
        options: &SwapOptions,
    ) -> Result<BuyFill, TradeError>;

    /// Sell `amount` smallest units of `token` back to SOL; returns the signature
    async fn sell(
        &self,
        signer: &Keypair,
        token: &str,
        amount: u64,
        options: &SwapOptions,
    ) -> Result<String, TradeError>;
}
