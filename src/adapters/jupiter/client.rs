//! Jupiter API Client
//!
//! HTTP client for the Jupiter swap API. Quotes go through the shared
//! [`RetryPolicy`]; swap execution is a single attempt that signs the
//! returned transaction and submits it through the ledger port.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use solana_sdk::hash::Hash;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::VersionedTransaction;

use super::quote::{QuoteRequest, QuoteResponse};
use super::swap::{SwapRequest, SwapResponse};
use crate::domain::{slippage_bps, sol_to_lamports, RetryPolicy, TradeError, MIN_SWAP_LAMPORTS, WSOL_MINT};
use crate::ports::{BuyFill, LedgerPort, SendOptions, SwapOptions, SwapPort};

/// Jupiter API client configuration
#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Base URL for Jupiter API
    pub api_base_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Slippage used when an agent has none configured
    pub default_slippage_pct: Decimal,
    pub restrict_intermediate_tokens: bool,
    pub wrap_and_unwrap_sol: bool,
    pub use_shared_accounts: bool,
    pub as_legacy_transaction: bool,
    /// Skip preflight simulation when submitting swaps
    pub skip_preflight: bool,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.jup.ag/swap/v1".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            default_slippage_pct: dec!(20),
            restrict_intermediate_tokens: false,
            wrap_and_unwrap_sol: true,
            use_shared_accounts: false,
            as_legacy_transaction: true,
            skip_preflight: true,
        }
    }
}

/// Jupiter DEX aggregator client
#[derive(Clone)]
pub struct JupiterClient {
    config: JupiterConfig,
    http: Client,
    retry: RetryPolicy,
    ledger: Arc<dyn LedgerPort>,
}

impl JupiterClient {
    pub fn new(
        config: JupiterConfig,
        retry: RetryPolicy,
        ledger: Arc<dyn LedgerPort>,
    ) -> Result<Self, TradeError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TradeError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            retry,
            ledger,
        })
    }

    /// Get the configured API base URL
    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Get a quote, retrying transport errors and rate limits.
    ///
    /// Other non-success statuses and unroutable quotes fail immediately.
    pub async fn get_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        slippage_pct: Decimal,
    ) -> Result<QuoteResponse, TradeError> {
        let request = QuoteRequest::new(input_mint, output_mint, amount, slippage_bps(slippage_pct))
            .with_restrict_intermediate_tokens(self.config.restrict_intermediate_tokens);

        self.retry
            .run("jupiter_get_quote", |_| self.request_quote(&request))
            .await
    }

    /// One quote request, no retries
    pub async fn request_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, TradeError> {
        let url = format!("{}/quote", self.config.api_base_url);

        let mut req = self.http.get(&url).query(&request.query_pairs());
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = req.send().await?;
        let status = response.status();
        tracing::debug!("Quote HTTP status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TradeError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Unexpected quote status {}: {}", status, body);
            return Err(TradeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let quote: QuoteResponse = response.json().await?;
        if !quote.has_route() {
            tracing::error!("Quote unsuccessful, no route plan: {:?}", quote);
            return Err(TradeError::Validation("Quote has no route plan".into()));
        }

        tracing::debug!(
            "Quote {} -> {}: in={} out={} via {:?}",
            quote.input_mint,
            quote.output_mint,
            quote.in_amount,
            quote.out_amount,
            quote.route_labels()
        );
        Ok(quote)
    }

    /// Build the swap for `quote`, sign it with `signer` and submit it.
    /// Returns the transaction signature.
    pub async fn execute(
        &self,
        signer: &Keypair,
        quote: &QuoteResponse,
        options: &SwapOptions,
    ) -> Result<String, TradeError> {
        let url = format!("{}/swap", self.config.api_base_url);
        let request = SwapRequest {
            user_public_key: signer.pubkey().to_string(),
            wrap_and_unwrap_sol: self.config.wrap_and_unwrap_sol,
            use_shared_accounts: self.config.use_shared_accounts,
            as_legacy_transaction: self.config.as_legacy_transaction,
            quote_response: serde_json::to_value(quote)?,
            prioritization_fee_lamports: None,
        }
        .with_priority_fee(options.priority_fee_lamports);
        tracing::debug!("Swap payload: {:?}", request);

        let mut req = self.http.post(&url).json(&request);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = req.send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TradeError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TradeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let swap: SwapResponse = response.json().await?;
        let bytes = swap
            .transaction_bytes()
            .ok_or_else(|| TradeError::Validation("No swapTransaction in response".into()))?
            .map_err(|e| TradeError::Validation(format!("Invalid transaction encoding: {}", e)))?;

        let raw = self.sign_transaction(signer, &bytes).await?;
        let signature = self
            .ledger
            .send_raw_transaction(
                raw,
                SendOptions {
                    skip_preflight: self.config.skip_preflight,
                },
            )
            .await?;

        tracing::debug!("Swap transaction signature: {}", signature);
        Ok(signature)
    }

    /// Deserialize, patch the blockhash if missing, sign, reserialize
    async fn sign_transaction(&self, signer: &Keypair, bytes: &[u8]) -> Result<Vec<u8>, TradeError> {
        let unsigned: VersionedTransaction = bincode::deserialize(bytes)
            .map_err(|e| TradeError::Validation(format!("Invalid transaction: {}", e)))?;

        let mut message = unsigned.message;
        if *message.recent_blockhash() == Hash::default() {
            let blockhash = self.ledger.get_latest_blockhash().await?;
            message.set_recent_blockhash(blockhash);
        }

        let signed = VersionedTransaction::try_new(message, &[signer])
            .map_err(|e| TradeError::Validation(format!("Signing failed: {}", e)))?;

        bincode::serialize(&signed)
            .map_err(|e| TradeError::Validation(format!("Serialization failed: {}", e)))
    }

    fn slippage_or_default(&self, options: &SwapOptions) -> Decimal {
        options
            .slippage_pct
            .unwrap_or(self.config.default_slippage_pct)
    }
}

/// Server-provided delay from a `Retry-After` header (whole seconds)
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl SwapPort for JupiterClient {
    async fn buy(
        &self,
        signer: &Keypair,
        token: &str,
        amount_sol: Decimal,
        options: &SwapOptions,
    ) -> Result<BuyFill, TradeError> {
        let lamports = sol_to_lamports(amount_sol)
            .ok_or_else(|| TradeError::Validation(format!("Invalid buy amount: {}", amount_sol)))?;
        tracing::debug!("Converting {} SOL to {} lamports", amount_sol, lamports);

        if lamports < MIN_SWAP_LAMPORTS {
            tracing::info!("Buy amount too small: {} lamports", lamports);
            return Err(TradeError::AmountTooSmall {
                lamports,
                minimum: MIN_SWAP_LAMPORTS,
            });
        }

        let quote = self
            .get_quote(WSOL_MINT, token, lamports, self.slippage_or_default(options))
            .await?;
        let out_amount = quote.output_amount();

        let signature = self.execute(signer, &quote, options).await?;
        tracing::info!("Jupiter buy TX: {} (out_amount={})", signature, out_amount);

        Ok(BuyFill {
            signature,
            out_amount,
        })
    }

    async fn sell(
        &self,
        signer: &Keypair,
        token: &str,
        amount: u64,
        options: &SwapOptions,
    ) -> Result<String, TradeError> {
        let quote = self
            .get_quote(token, WSOL_MINT, amount, self.slippage_or_default(options))
            .await?;

        let signature = self.execute(signer, &quote, options).await?;
        tracing::info!("Jupiter sell TX: {}", signature);
        Ok(signature)
    }
}
