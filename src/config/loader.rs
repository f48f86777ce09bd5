//! Configuration Loader
//!
//! Loads and validates the engine configuration from a TOML file. Every
//! section is optional and falls back to the defaults shown in
//! `config/lynx.example.toml`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::jupiter::JupiterConfig;
use crate::adapters::solana::parse_commitment;
use crate::application::{CycleConfig, FundsConfig};
use crate::domain::RetryPolicy;

/// Main configuration structure matching lynx.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub jupiter: JupiterSection,
    pub retry: RetrySection,
    pub solana: SolanaSection,
    pub cycle: CycleSection,
    pub funds: FundsSection,
    pub store: StoreSection,
    pub logging: LoggingSection,
    pub alerts: AlertsSection,
}

/// Jupiter API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JupiterSection {
    /// Jupiter swap API base URL
    pub api_url: String,
    /// Optional API key for higher rate limits (get from jup.ag)
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Slippage in percent for agents without their own
    pub default_slippage_pct: Decimal,
    pub restrict_intermediate_tokens: bool,
    pub wrap_and_unwrap_sol: bool,
    pub use_shared_accounts: bool,
    pub as_legacy_transaction: bool,
}

impl Default for JupiterSection {
    fn default() -> Self {
        Self {
            api_url: "https://api.jup.ag/swap/v1".to_string(),
            api_key: None,
            timeout_secs: 30,
            default_slippage_pct: dec!(20),
            restrict_intermediate_tokens: false,
            wrap_and_unwrap_sol: true,
            use_shared_accounts: false,
            as_legacy_transaction: true,
        }
    }
}

impl JupiterSection {
    /// Get API key with environment variable fallback
    /// Checks JUPITER_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("JUPITER_API_KEY").ok().filter(|key| !key.is_empty())
    }
}

/// Retry policy for aggregator calls
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    /// Backoff base; attempt n waits base * 2^n
    pub base_delay_ms: u64,
    /// Random extra delay added to backoff, 0 disables
    pub jitter_ms: u64,
    pub honor_retry_after: bool,
    /// Wait on 429 without a usable Retry-After header
    pub default_retry_after_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1_000,
            jitter_ms: 0,
            honor_retry_after: true,
            default_retry_after_secs: 5,
        }
    }
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolanaSection {
    /// RPC endpoint (use private RPC for production)
    pub rpc_url: String,
    /// Commitment level: "processed", "confirmed", "finalized"
    pub commitment: String,
    /// RPC request timeout in seconds
    pub timeout_secs: u64,
    /// Skip preflight simulation when submitting swaps
    pub skip_preflight: bool,
}

impl Default for SolanaSection {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            timeout_secs: 30,
            skip_preflight: true,
        }
    }
}

impl SolanaSection {
    /// Get RPC URL with environment variable override
    /// Checks SOLANA_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }
}

/// Trading cycle timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CycleSection {
    pub settings_poll_secs: u64,
    pub buy_retry_secs: u64,
    pub min_rest_secs: u64,
    /// Delay between consecutive agent starts
    pub spawn_stagger_secs: u64,
    pub max_sell_retries: u32,
}

impl Default for CycleSection {
    fn default() -> Self {
        Self {
            settings_poll_secs: 5,
            buy_retry_secs: 1,
            min_rest_secs: 1,
            spawn_stagger_secs: 1,
            max_sell_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FundsSection {
    /// SOL kept in each agent wallet by a sweep
    pub sweep_reserve_sol: Decimal,
}

impl Default for FundsSection {
    fn default() -> Self {
        Self {
            sweep_reserve_sol: dec!(0.001),
        }
    }
}

/// Settings/wallet store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// JSON document written by the chat layer
    pub path: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: "~/.lynx/store.json".to_string(),
        }
    }
}

impl StoreSection {
    /// Store path with `~` expanded
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).into_owned())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Alerts configuration section (optional)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AlertsSection {
    /// Enable Telegram notifications
    pub telegram_enabled: bool,
    /// Telegram bot token
    pub telegram_bot_token: String,
}

impl AlertsSection {
    /// Bot token with TELEGRAM_BOT_TOKEN env fallback
    pub fn get_bot_token(&self) -> Option<String> {
        if !self.telegram_bot_token.is_empty() {
            return Some(self.telegram_bot_token.clone());
        }
        std::env::var("TELEGRAM_BOT_TOKEN").ok().filter(|t| !t.is_empty())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jupiter.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api_url cannot be empty".to_string(),
            ));
        }

        if self.jupiter.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "jupiter.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.jupiter.default_slippage_pct <= Decimal::ZERO
            || self.jupiter.default_slippage_pct > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::ValidationError(format!(
                "default_slippage_pct must be 0-100, got {}",
                self.jupiter.default_slippage_pct
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".to_string(),
            ));
        }

        if self.solana.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if parse_commitment(&self.solana.commitment).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "commitment must be processed, confirmed or finalized, got {}",
                self.solana.commitment
            )));
        }

        if self.cycle.max_sell_retries == 0 {
            return Err(ConfigError::ValidationError(
                "cycle.max_sell_retries must be > 0".to_string(),
            ));
        }

        if self.funds.sweep_reserve_sol < Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "sweep_reserve_sol must be >= 0, got {}",
                self.funds.sweep_reserve_sol
            )));
        }

        if self.store.path.is_empty() {
            return Err(ConfigError::ValidationError(
                "store.path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn jupiter_config(&self) -> JupiterConfig {
        JupiterConfig {
            api_base_url: self.jupiter.api_url.trim_end_matches('/').to_string(),
            api_key: self.jupiter.get_api_key(),
            timeout: Duration::from_secs(self.jupiter.timeout_secs),
            default_slippage_pct: self.jupiter.default_slippage_pct,
            restrict_intermediate_tokens: self.jupiter.restrict_intermediate_tokens,
            wrap_and_unwrap_sol: self.jupiter.wrap_and_unwrap_sol,
            use_shared_accounts: self.jupiter.use_shared_accounts,
            as_legacy_transaction: self.jupiter.as_legacy_transaction,
            skip_preflight: self.solana.skip_preflight,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            jitter: Duration::from_millis(self.retry.jitter_ms),
            honor_server_delay: self.retry.honor_retry_after,
            default_server_delay: Duration::from_secs(self.retry.default_retry_after_secs),
        }
    }

    pub fn cycle_config(&self) -> CycleConfig {
        CycleConfig {
            settings_poll: Duration::from_secs(self.cycle.settings_poll_secs),
            buy_retry: Duration::from_secs(self.cycle.buy_retry_secs),
            min_rest: Duration::from_secs(self.cycle.min_rest_secs),
            max_sell_retries: self.cycle.max_sell_retries,
        }
    }

    pub fn spawn_stagger(&self) -> Duration {
        Duration::from_secs(self.cycle.spawn_stagger_secs)
    }

    pub fn funds_config(&self) -> FundsConfig {
        FundsConfig {
            sweep_reserve: self.funds.sweep_reserve_sol,
        }
    }
}
