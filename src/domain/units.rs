//! Amount Units
//!
//! Conversions between SOL-denominated decimals and lamports, plus the
//! slippage percent to basis point mapping used by the aggregator.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Lamports in one SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Smallest buy the swap client will send to the aggregator (0.0001 SOL)
pub const MIN_SWAP_LAMPORTS: u64 = 100_000;

/// Wrapped SOL mint, the native side of every buy and sell
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Upper bound for slippage (100%)
pub const MAX_SLIPPAGE_BPS: u16 = 10_000;

/// Convert a SOL amount to lamports, truncating sub-lamport dust.
///
/// Returns `None` for negative amounts or values that overflow `u64`.
pub fn sol_to_lamports(sol: Decimal) -> Option<u64> {
    if sol.is_sign_negative() && !sol.is_zero() {
        return None;
    }
    sol.checked_mul(Decimal::from(LAMPORTS_PER_SOL))?
        .trunc()
        .to_u64()
}

/// Convert lamports to a SOL amount (exact)
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)
}

/// Slippage percent (20 = 20%) to basis points, clamped to 0..=10000
pub fn slippage_bps(percent: Decimal) -> u16 {
    if percent.is_sign_negative() {
        return 0;
    }
    (percent * Decimal::ONE_HUNDRED)
        .trunc()
        .to_u64()
        .map(|bps| bps.min(MAX_SLIPPAGE_BPS as u64) as u16)
        .unwrap_or(MAX_SLIPPAGE_BPS)
}
