//! Jupiter Quote Types
//!
//! Request and response structures for the Jupiter quote API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Request parameters for getting a swap quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    /// Input token mint address
    pub input_mint: String,
    /// Output token mint address
    pub output_mint: String,
    /// Amount in base units (lamports for SOL)
    pub amount: u64,
    /// Slippage tolerance in basis points (1 = 0.01%)
    pub slippage_bps: u16,
    /// Only route through the aggregator's curated intermediate tokens
    pub restrict_intermediate_tokens: bool,
}

impl QuoteRequest {
    pub fn new(input_mint: impl Into<String>, output_mint: impl Into<String>, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint: input_mint.into(),
            output_mint: output_mint.into(),
            amount,
            slippage_bps,
            restrict_intermediate_tokens: false,
        }
    }

    pub fn with_restrict_intermediate_tokens(mut self, restrict: bool) -> Self {
        self.restrict_intermediate_tokens = restrict;
        self
    }

    /// Query string pairs, in the order the API documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("inputMint", self.input_mint.clone()),
            ("outputMint", self.output_mint.clone()),
            ("amount", self.amount.to_string()),
            ("slippageBps", self.slippage_bps.to_string()),
            (
                "restrictIntermediateTokens",
                self.restrict_intermediate_tokens.to_string(),
            ),
        ]
    }
}

/// Response from the quote API.
///
/// Unknown fields are kept in `extra` so the quote can be echoed back to the
/// swap endpoint unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub output_mint: String,
    /// Input amount in base units
    pub in_amount: String,
    /// Output amount in base units
    pub out_amount: String,
    /// Minimum output amount after slippage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_amount_threshold: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage_bps: Option<u16>,
    /// Route plan with swap details; empty means no usable route
    #[serde(default)]
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl QuoteResponse {
    /// Get input amount as u64
    pub fn input_amount(&self) -> u64 {
        self.in_amount.parse().unwrap_or(0)
    }

    /// Get output amount as u64; unparseable amounts read as zero
    pub fn output_amount(&self) -> u64 {
        self.out_amount.parse().unwrap_or(0)
    }

    pub fn has_route(&self) -> bool {
        !self.route_plan.is_empty()
    }

    /// DEX labels along the route, for logging
    pub fn route_labels(&self) -> Vec<&str> {
        self.route_plan
            .iter()
            .filter_map(|step| step.swap_info.as_ref())
            .map(|info| info.label.as_str())
            .collect()
    }
}

/// A step in the route plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_info: Option<SwapInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Information about a single swap in the route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    /// Label for the DEX (e.g., "Raydium", "Orca")
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE_JSON: &str = r#"{
        "inputMint": "So11111111111111111111111111111111111111112",
        "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
        "inAmount": "1000000000",
        "outAmount": "150000000",
        "otherAmountThreshold": "149250000",
        "swapMode": "ExactIn",
        "slippageBps": 2000,
        "priceImpactPct": "0.12",
        "routePlan": [{
            "swapInfo": {
                "ammKey": "pool123",
                "label": "Raydium",
                "inAmount": "1000000000",
                "outAmount": "150000000"
            },
            "percent": 100
        }],
        "contextSlot": 321
    }"#;

    #[test]
    fn test_query_pairs() {
        let req = QuoteRequest::new("So111", "Mint", 100_000, 2_000);
        let pairs = req.query_pairs();
        assert_eq!(pairs[2], ("amount", "100000".to_string()));
        assert_eq!(pairs[3], ("slippageBps", "2000".to_string()));
        assert_eq!(pairs[4], ("restrictIntermediateTokens", "false".to_string()));
    }

    #[test]
    fn test_quote_response_parsing() {
        let quote: QuoteResponse = serde_json::from_str(QUOTE_JSON).unwrap();
        assert_eq!(quote.input_amount(), 1_000_000_000);
        assert_eq!(quote.output_amount(), 150_000_000);
        assert!(quote.has_route());
        assert_eq!(quote.route_labels(), vec!["Raydium"]);
    }

    #[test]
    fn test_quote_echoes_unknown_fields() {
        let quote: QuoteResponse = serde_json::from_str(QUOTE_JSON).unwrap();
        let echoed = serde_json::to_value(&quote).unwrap();
        let original: serde_json::Value = serde_json::from_str(QUOTE_JSON).unwrap();
        assert_eq!(echoed, original);
    }

    #[test]
    fn test_missing_route_plan_is_unroutable() {
        let json = r#"{
            "inputMint": "A", "outputMint": "B",
            "inAmount": "1", "outAmount": "2"
        }"#;
        let quote: QuoteResponse = serde_json::from_str(json).unwrap();
        assert!(!quote.has_route());
    }

    #[test]
    fn test_bad_out_amount_reads_zero() {
        let json = r#"{
            "inputMint": "A", "outputMint": "B",
            "inAmount": "1", "outAmount": "lots", "routePlan": [{}]
        }"#;
        let quote: QuoteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(quote.output_amount(), 0);
    }
}
